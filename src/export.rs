//! Materializing a server-side CSV export into a local file.
//!
//! The server answers an export request with either a downloadable URL or,
//! in fallback mode, a self-contained `data:` URL. Fallback payloads are
//! decoded locally; only the non-fallback path performs a network fetch.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::info;

use crate::api::{ApiError, ExportResponse};

/// Default destination for exported files.
pub fn default_export_dir() -> PathBuf {
  dirs::download_dir()
    .or_else(dirs::home_dir)
    .unwrap_or_else(std::env::temp_dir)
}

/// Turn an export response into a file under `dir` and return its path.
pub async fn materialize(
  http: &reqwest::Client,
  export: &ExportResponse,
  dir: &Path,
) -> Result<PathBuf, ApiError> {
  let bytes = if export.is_fallback() {
    decode_data_url(&export.url).map_err(ApiError::Export)?
  } else {
    fetch_bytes(http, &export.url).await?
  };

  let path = dir.join(file_name(&export.key));
  std::fs::create_dir_all(dir)?;
  std::fs::write(&path, &bytes)?;
  info!(path = %path.display(), bytes = bytes.len(), "export written");

  Ok(path)
}

/// Decode the payload of a `data:` URL (RFC 2397): base64 when the
/// metadata says so, percent-encoded text otherwise.
fn decode_data_url(url: &str) -> Result<Vec<u8>, String> {
  let rest = url
    .strip_prefix("data:")
    .ok_or_else(|| "fallback export did not return a data URL".to_string())?;
  let (meta, payload) = rest
    .split_once(',')
    .ok_or_else(|| "malformed data URL: missing payload separator".to_string())?;

  if meta.ends_with(";base64") {
    BASE64
      .decode(payload)
      .map_err(|e| format!("invalid base64 payload: {}", e))
  } else {
    Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
  }
}

async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, ApiError> {
  let response = http.get(url).send().await.map_err(ApiError::Network)?;

  let status = response.status();
  if !status.is_success() {
    return Err(ApiError::Status {
      status,
      message: "export download failed".to_string(),
    });
  }

  Ok(response.bytes().await.map_err(ApiError::Decode)?.to_vec())
}

/// File name for an export, from the key's last path segment.
fn file_name(key: &str) -> &str {
  match key.rsplit('/').next() {
    Some(name) if !name.is_empty() => name,
    _ => "links.csv",
  }
}
