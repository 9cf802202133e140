//! Failure taxonomy for API operations.

use reqwest::StatusCode;

/// Everything that can go wrong talking to the shortener backend, plus the
/// local steps of materializing an export.
///
/// Mutations keep this type all the way to the UI so it can branch on the
/// failure kind (conflict → field error, not-found → terminal state) instead
/// of pattern-matching display strings.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// The request never completed (connection refused, DNS, TLS, ...).
  #[error("request failed: {0}")]
  Network(#[source] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("server returned {status}: {message}")]
  Status { status: StatusCode, message: String },

  /// The response body did not match the declared contract.
  #[error("invalid response body: {0}")]
  Decode(#[source] reqwest::Error),

  /// A request body failed to serialize.
  #[error("failed to encode request body: {0}")]
  Encode(#[from] serde_json::Error),

  /// An export payload could not be materialized into file contents.
  #[error("could not materialize export: {0}")]
  Export(String),

  /// Writing the exported file failed.
  #[error("failed to write export file: {0}")]
  Io(#[from] std::io::Error),

  /// The in-flight operation was dropped before it completed.
  #[error("operation was cancelled")]
  Cancelled,
}

impl ApiError {
  /// HTTP status code, when the server produced one.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      ApiError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// True when the server reported the resource as unknown.
  pub fn is_not_found(&self) -> bool {
    self.status() == Some(StatusCode::NOT_FOUND)
  }

  /// True when a create failed because the slug is already taken.
  ///
  /// The server signals this as 409 or with an "already exists" message;
  /// both spellings are seen in the wild, so check for either.
  pub fn is_slug_conflict(&self) -> bool {
    match self {
      ApiError::Status { status, message } => {
        *status == StatusCode::CONFLICT || message.to_lowercase().contains("already exists")
      }
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_conflict_detected_by_status() {
    let err = ApiError::Status {
      status: StatusCode::CONFLICT,
      message: "duplicate".to_string(),
    };
    assert!(err.is_slug_conflict());
  }

  #[test]
  fn test_conflict_detected_by_message() {
    let err = ApiError::Status {
      status: StatusCode::BAD_REQUEST,
      message: "This slug already exists".to_string(),
    };
    assert!(err.is_slug_conflict());
  }

  #[test]
  fn test_plain_failure_is_not_conflict() {
    let err = ApiError::Status {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      message: "boom".to_string(),
    };
    assert!(!err.is_slug_conflict());
    assert!(!err.is_not_found());
  }

  #[test]
  fn test_not_found() {
    let err = ApiError::Status {
      status: StatusCode::NOT_FOUND,
      message: "no such slug".to_string(),
    };
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
  }
}
