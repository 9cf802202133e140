//! HTTP client for the shortener backend.
//!
//! All endpoint calls funnel through one `request` path: absolute URL from
//! the configured base, JSON content type, a single attempt (no retries, no
//! timeout), non-success statuses mapped to [`ApiError::Status`]. Failures
//! are logged before they propagate so the log file tells the whole story
//! even when the UI reduces an error to one line.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::error;
use url::Url;

use super::error::ApiError;
use super::types::{CreateLinkRequest, ErrorBody, ExportResponse, Link, LinksPage, ResolvedLink};

/// Client for the shortener REST API.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  /// Create a client for the given base URL, e.g. `http://localhost:3333`.
  pub fn new(base_url: &str) -> Result<Self> {
    Url::parse(base_url).map_err(|e| eyre!("Invalid server URL {}: {}", base_url, e))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  /// The configured base URL, without a trailing slash.
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// The underlying transport, for plain binary fetches outside the API
  /// surface (export downloads).
  pub fn http(&self) -> &reqwest::Client {
    &self.http
  }

  /// Create a short link. The server rejects a taken slug.
  pub async fn create_link(&self, req: &CreateLinkRequest) -> Result<Link, ApiError> {
    self
      .request(Method::POST, "/links", Some(serde_json::to_value(req)?))
      .await
  }

  /// List all links.
  pub async fn list_links(&self) -> Result<LinksPage, ApiError> {
    self.request(Method::GET, "/links", None).await
  }

  /// Delete a link by id. Success carries an empty body.
  pub async fn delete_link(&self, id: &str) -> Result<(), ApiError> {
    self
      .send(Method::DELETE, &format!("/links/{}", id), None)
      .await?;
    Ok(())
  }

  /// Resolve a slug to its destination URL. Fails with 404 for unknown slugs.
  pub async fn resolve_slug(&self, slug: &str) -> Result<ResolvedLink, ApiError> {
    self
      .request(Method::GET, &format!("/links/{}/original", slug), None)
      .await
  }

  /// Ask the server to generate a CSV export of all links.
  pub async fn request_export(&self) -> Result<ExportResponse, ApiError> {
    self
      .request(Method::POST, "/exports/links", Some(serde_json::json!({})))
      .await
  }

  /// Perform a request and parse the body as `T`.
  async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
  ) -> Result<T, ApiError> {
    let response = self.send(method, path, body).await?;
    response.json::<T>().await.map_err(|e| {
      error!(path, error = %e, "response body did not match contract");
      ApiError::Decode(e)
    })
  }

  /// Perform a request and map a non-success status to an error.
  async fn send(
    &self,
    method: Method,
    path: &str,
    body: Option<serde_json::Value>,
  ) -> Result<reqwest::Response, ApiError> {
    let url = format!("{}{}", self.base_url, path);

    let mut builder = self
      .http
      .request(method, &url)
      .header(CONTENT_TYPE, "application/json");
    if let Some(body) = &body {
      builder = builder.json(body);
    }

    let response = builder.send().await.map_err(|e| {
      error!(%url, error = %e, "request failed");
      ApiError::Network(e)
    })?;

    let status = response.status();
    if !status.is_success() {
      let message = extract_message(response).await;
      error!(%url, %status, message, "server rejected request");
      return Err(ApiError::Status { status, message });
    }

    Ok(response)
  }
}

/// Pull a human-readable message out of an error response. The server
/// usually sends `{"message": "..."}`; fall back to the raw body text.
async fn extract_message(response: reqwest::Response) -> String {
  let text = response.text().await.unwrap_or_default();
  match serde_json::from_str::<ErrorBody>(&text) {
    Ok(body) => body.message,
    Err(_) => text,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_invalid_base_url() {
    assert!(ApiClient::new("not a url").is_err());
  }

  #[test]
  fn test_strips_trailing_slash() {
    let client = ApiClient::new("http://localhost:3333/").unwrap();
    assert_eq!(client.base_url(), "http://localhost:3333");
  }

  #[tokio::test]
  async fn test_connection_failure_maps_to_network_error() {
    // Port 9 (discard) is a safe never-listening target.
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let err = client.list_links().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }
}
