//! Synchronization layer for the "links" resource.
//!
//! One list query plus three mutations over a single [`LinkService`], with
//! the cache policy applied in `poll()`:
//!
//! - create success invalidates the list (no optimistic insert; a slug
//!   collision must be server-confirmed before anything is displayed)
//! - delete success prunes the id from the snapshot immediately, without a
//!   round trip
//! - delete failure invalidates, reconciling the view with server truth
//! - export never touches the cache
//!
//! A failed mutation can therefore never leave the snapshot worse than
//! before the optimistic change.

use std::path::PathBuf;

use crate::api::{CreateLinkRequest, Link, LinkService};
use crate::query::{Mutation, MutationState, Query, QueryState};

/// Completion flags from one `poll()` pass, so the UI can react exactly
/// once per settled operation (reset the form, show a status line).
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncEvents {
  pub create_completed: bool,
  pub delete_completed: bool,
  pub export_completed: bool,
}

/// Cached reads and writes for the links collection.
pub struct LinksSync<C: LinkService> {
  client: C,
  list: Query<Vec<Link>>,
  create: Mutation<Link, CreateLinkRequest>,
  delete: Mutation<String, String>,
  export: Mutation<PathBuf, PathBuf>,
}

impl<C: LinkService> LinksSync<C> {
  /// Build the layer and start the initial list fetch.
  pub fn new(client: C) -> Self {
    let fetch_client = client.clone();
    let mut list = Query::new(move || {
      let client = fetch_client.clone();
      async move {
        let page = client.list_links().await.map_err(|e| e.to_string())?;
        if page.next_cursor.is_some() {
          tracing::debug!(cursor = ?page.next_cursor, "list response carried a pagination cursor; not consumed");
        }
        Ok(page.data)
      }
    });
    list.fetch();

    let create_client = client.clone();
    let create = Mutation::new(move |req: CreateLinkRequest| {
      let client = create_client.clone();
      async move { client.create_link(req).await }
    });

    let delete_client = client.clone();
    let delete = Mutation::new(move |id: String| {
      let client = delete_client.clone();
      async move {
        client.delete_link(&id).await?;
        Ok(id)
      }
    });

    let export_client = client.clone();
    let export = Mutation::new(move |dir: PathBuf| {
      let client = export_client.clone();
      async move { client.export_links(&dir).await }
    });

    Self {
      client,
      list,
      create,
      delete,
      export,
    }
  }

  pub fn client(&self) -> &C {
    &self.client
  }

  /// The cached snapshot, empty until the first fetch completes.
  pub fn links(&self) -> &[Link] {
    self.list.data().map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn list_state(&self) -> &QueryState<Vec<Link>> {
    self.list.state()
  }

  pub fn is_loading(&self) -> bool {
    self.list.is_loading()
  }

  /// Manual refresh (the `r` key).
  pub fn refresh(&mut self) {
    self.list.refetch();
  }

  pub fn create(&mut self, req: CreateLinkRequest) {
    self.create.mutate(req);
  }

  pub fn create_state(&self) -> &MutationState<Link> {
    self.create.state()
  }

  pub fn create_pending(&self) -> bool {
    self.create.is_pending()
  }

  pub fn delete(&mut self, id: String) {
    self.delete.mutate(id);
  }

  pub fn delete_state(&self) -> &MutationState<String> {
    self.delete.state()
  }

  pub fn delete_pending(&self) -> bool {
    self.delete.is_pending()
  }

  pub fn export(&mut self, dir: PathBuf) {
    self.export.mutate(dir);
  }

  pub fn export_state(&self) -> &MutationState<PathBuf> {
    self.export.state()
  }

  pub fn export_pending(&self) -> bool {
    self.export.is_pending()
  }

  /// Drain all in-flight operations once and apply cache policy.
  ///
  /// Call every tick.
  pub fn poll(&mut self) -> SyncEvents {
    let mut events = SyncEvents::default();

    self.list.poll();

    if self.create.poll() {
      events.create_completed = true;
      if self.create.state().is_success() {
        self.list.invalidate();
      }
    }

    if self.delete.poll() {
      events.delete_completed = true;
      match self.delete.state() {
        MutationState::Success(id) => {
          // Optimistic removal: the entry disappears before any refetch
          // confirms it. Remove-by-id is the only local edit the
          // snapshot ever sees.
          let id = id.clone();
          self.list.update_data(|links| links.retain(|l| l.id != id));
        }
        MutationState::Error(_) => {
          self.list.invalidate();
        }
        _ => {}
      }
    }

    if self.export.poll() {
      events.export_completed = true;
    }

    events
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{ApiError, LinksPage, ResolvedLink};
  use async_trait::async_trait;
  use chrono::Utc;
  use reqwest::StatusCode;
  use std::path::Path;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};
  use std::time::Duration;

  fn link(id: &str, slug: &str) -> Link {
    Link {
      id: id.to_string(),
      original_url: format!("https://example.com/{}", slug),
      slug: slug.to_string(),
      clicks: 5,
      created_at: Utc::now(),
    }
  }

  /// In-memory stand-in for the backend: a mutable link table plus
  /// failure switches.
  #[derive(Clone)]
  struct StubService {
    links: Arc<Mutex<Vec<Link>>>,
    list_calls: Arc<AtomicUsize>,
    fail_delete: Arc<AtomicBool>,
    conflict_on_create: Arc<AtomicBool>,
  }

  impl StubService {
    fn with_links(links: Vec<Link>) -> Self {
      Self {
        links: Arc::new(Mutex::new(links)),
        list_calls: Arc::new(AtomicUsize::new(0)),
        fail_delete: Arc::new(AtomicBool::new(false)),
        conflict_on_create: Arc::new(AtomicBool::new(false)),
      }
    }
  }

  #[async_trait]
  impl LinkService for StubService {
    async fn list_links(&self) -> Result<LinksPage, ApiError> {
      self.list_calls.fetch_add(1, Ordering::SeqCst);
      Ok(LinksPage {
        data: self.links.lock().unwrap().clone(),
        next_cursor: None,
      })
    }

    async fn create_link(&self, req: CreateLinkRequest) -> Result<Link, ApiError> {
      if self.conflict_on_create.load(Ordering::SeqCst) {
        return Err(ApiError::Status {
          status: StatusCode::CONFLICT,
          message: "slug already exists".to_string(),
        });
      }
      let slug = req.slug.unwrap_or_else(|| "generated".to_string());
      let created = Link {
        id: format!("id-{}", slug),
        original_url: req.original_url,
        slug,
        clicks: 0,
        created_at: Utc::now(),
      };
      self.links.lock().unwrap().push(created.clone());
      Ok(created)
    }

    async fn delete_link(&self, id: &str) -> Result<(), ApiError> {
      if self.fail_delete.load(Ordering::SeqCst) {
        return Err(ApiError::Status {
          status: StatusCode::INTERNAL_SERVER_ERROR,
          message: "delete failed".to_string(),
        });
      }
      self.links.lock().unwrap().retain(|l| l.id != id);
      Ok(())
    }

    async fn resolve_slug(&self, slug: &str) -> Result<ResolvedLink, ApiError> {
      self
        .links
        .lock()
        .unwrap()
        .iter()
        .find(|l| l.slug == slug)
        .map(|l| ResolvedLink {
          original_url: l.original_url.clone(),
        })
        .ok_or(ApiError::Status {
          status: StatusCode::NOT_FOUND,
          message: "slug not found".to_string(),
        })
    }

    async fn export_links(&self, dir: &Path) -> Result<PathBuf, ApiError> {
      Ok(dir.join("links.csv"))
    }
  }

  /// Poll until `done` holds or the deadline passes.
  async fn settle<C: LinkService>(
    sync: &mut LinksSync<C>,
    done: impl Fn(&LinksSync<C>) -> bool,
  ) {
    for _ in 0..100 {
      sync.poll();
      if done(sync) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("sync did not settle in time");
  }

  #[tokio::test]
  async fn test_list_populates_snapshot() {
    let service = StubService::with_links(vec![link("1", "x")]);
    let mut sync = LinksSync::new(service);

    settle(&mut sync, |s| s.list_state().is_success()).await;
    assert_eq!(sync.links().len(), 1);
    assert_eq!(sync.links()[0].slug, "x");
  }

  #[tokio::test]
  async fn test_create_invalidates_and_refetch_contains_new_entry() {
    let service = StubService::with_links(vec![]);
    let mut sync = LinksSync::new(service.clone());
    settle(&mut sync, |s| s.list_state().is_success()).await;

    sync.create(CreateLinkRequest {
      original_url: "https://example.com".to_string(),
      slug: Some("abc".to_string()),
    });

    // The create completion invalidates, and the refetched authoritative
    // list carries the new entry.
    settle(&mut sync, |s| s.links().iter().any(|l| l.slug == "abc")).await;
    assert!(sync.create_state().is_success());
    assert!(service.list_calls.load(Ordering::SeqCst) >= 2);
  }

  #[tokio::test]
  async fn test_create_conflict_classified_and_list_untouched() {
    let service = StubService::with_links(vec![link("1", "abc")]);
    service.conflict_on_create.store(true, Ordering::SeqCst);
    let mut sync = LinksSync::new(service.clone());
    settle(&mut sync, |s| s.list_state().is_success()).await;
    let fetches_before = service.list_calls.load(Ordering::SeqCst);

    sync.create(CreateLinkRequest {
      original_url: "https://example.com".to_string(),
      slug: Some("abc".to_string()),
    });
    settle(&mut sync, |s| !s.create_pending()).await;

    let err = sync.create_state().error().expect("create should fail");
    assert!(err.is_slug_conflict());
    // No list mutation and no reconciling refetch for a failed create.
    assert_eq!(sync.links().len(), 1);
    assert_eq!(service.list_calls.load(Ordering::SeqCst), fetches_before);
  }

  #[tokio::test]
  async fn test_delete_success_prunes_snapshot_without_refetch() {
    let service = StubService::with_links(vec![link("1", "x"), link("2", "y")]);
    let mut sync = LinksSync::new(service.clone());
    settle(&mut sync, |s| s.list_state().is_success()).await;
    let fetches_before = service.list_calls.load(Ordering::SeqCst);

    sync.delete("1".to_string());
    settle(&mut sync, |s| !s.delete_pending()).await;

    // Pruned the moment the delete settled, with no refetch issued.
    assert!(sync.links().iter().all(|l| l.id != "1"));
    assert_eq!(sync.links().len(), 1);
    assert_eq!(service.list_calls.load(Ordering::SeqCst), fetches_before);
  }

  #[tokio::test]
  async fn test_delete_failure_reconciles_to_server_truth() {
    let service = StubService::with_links(vec![link("1", "x")]);
    service.fail_delete.store(true, Ordering::SeqCst);
    let mut sync = LinksSync::new(service.clone());
    settle(&mut sync, |s| s.list_state().is_success()).await;

    sync.delete("1".to_string());
    settle(&mut sync, |s| !s.delete_pending()).await;
    assert!(sync.delete_state().error().is_some());

    // The failure triggered an invalidate; once the refetch lands the
    // entry the server still holds is back in view.
    settle(&mut sync, |s| {
      s.list_state().is_success() && s.links().iter().any(|l| l.id == "1")
    })
    .await;
  }

  #[tokio::test]
  async fn test_export_completes_without_touching_list() {
    let service = StubService::with_links(vec![link("1", "x")]);
    let mut sync = LinksSync::new(service.clone());
    settle(&mut sync, |s| s.list_state().is_success()).await;
    let fetches_before = service.list_calls.load(Ordering::SeqCst);

    sync.export(PathBuf::from("/tmp"));
    settle(&mut sync, |s| !s.export_pending()).await;

    assert!(sync.export_state().is_success());
    assert_eq!(service.list_calls.load(Ordering::SeqCst), fetches_before);
  }

  #[tokio::test]
  async fn test_poll_reports_completion_once() {
    let service = StubService::with_links(vec![link("1", "x")]);
    let mut sync = LinksSync::new(service);
    settle(&mut sync, |s| s.list_state().is_success()).await;

    sync.delete("1".to_string());
    let mut completions = 0;
    for _ in 0..50 {
      if sync.poll().delete_completed {
        completions += 1;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(completions, 1);
  }
}
