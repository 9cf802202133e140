//! Typed access to the shortener backend.

mod client;
mod error;
mod types;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{CreateLinkRequest, ExportResponse, Link, LinksPage, ResolvedLink};

/// The operations the synchronization layer needs from the backend.
///
/// `ApiClient` is the real implementation; tests substitute an in-memory
/// stub so cache policy can be exercised without a server.
#[async_trait]
pub trait LinkService: Clone + Send + Sync + 'static {
  async fn list_links(&self) -> Result<LinksPage, ApiError>;

  async fn create_link(&self, req: CreateLinkRequest) -> Result<Link, ApiError>;

  async fn delete_link(&self, id: &str) -> Result<(), ApiError>;

  async fn resolve_slug(&self, slug: &str) -> Result<ResolvedLink, ApiError>;

  /// Run a full export: request it server-side, then materialize the result
  /// into a CSV file under `dir`. Returns the written path.
  async fn export_links(&self, dir: &Path) -> Result<PathBuf, ApiError>;
}

#[async_trait]
impl LinkService for ApiClient {
  async fn list_links(&self) -> Result<LinksPage, ApiError> {
    ApiClient::list_links(self).await
  }

  async fn create_link(&self, req: CreateLinkRequest) -> Result<Link, ApiError> {
    ApiClient::create_link(self, &req).await
  }

  async fn delete_link(&self, id: &str) -> Result<(), ApiError> {
    ApiClient::delete_link(self, id).await
  }

  async fn resolve_slug(&self, slug: &str) -> Result<ResolvedLink, ApiError> {
    ApiClient::resolve_slug(self, slug).await
  }

  async fn export_links(&self, dir: &Path) -> Result<PathBuf, ApiError> {
    let export = self.request_export().await?;
    crate::export::materialize(self.http(), &export, dir).await
  }
}
