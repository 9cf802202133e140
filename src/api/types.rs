//! Wire types for the shortener API.
//!
//! One explicit struct per endpoint payload, so a shape change on the server
//! fails at deserialization instead of propagating an unexpected value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link as stored by the server.
///
/// The client never mutates these fields; it only requests creation or
/// deletion and re-reads the authoritative list. `clicks` is incremented
/// server-side when a slug is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
  pub id: String,
  pub original_url: String,
  pub slug: String,
  pub clicks: u64,
  pub created_at: DateTime<Utc>,
}

/// Body for `POST /links`. The slug is optional; the server picks one when
/// it is absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
  pub original_url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
}

/// Response of `GET /links`.
///
/// `next_cursor` is part of the server contract but no caller pages through
/// results; it is kept so the contract stays truthful.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksPage {
  pub data: Vec<Link>,
  pub next_cursor: Option<String>,
}

/// Response of `GET /links/{slug}/original`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
  pub original_url: String,
}

/// Response of `POST /exports/links`.
///
/// `url` is a downloadable resource locator, except when `fallback` is set:
/// then it is a self-contained `data:` URL the client materializes locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
  pub key: String,
  pub url: String,
  #[serde(default)]
  pub fallback: Option<bool>,
}

impl ExportResponse {
  pub fn is_fallback(&self) -> bool {
    self.fallback.unwrap_or(false)
  }
}

/// Error body the server attaches to non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
  pub message: String,
}
