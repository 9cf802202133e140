//! Async query and mutation primitives for data fetching.
//!
//! Inspired by TanStack Query: a `Query<T>` encapsulates one cached read
//! (fetch, loading state, snapshot, invalidation), a `Mutation<T, I>` one
//! write operation whose completion the caller observes exactly once so it
//! can apply cache policy (invalidate, optimistic update).
//!
//! Both run their futures on the tokio runtime and report back over a
//! channel that the owner drains with `poll()` from the event-loop tick.
//! A fetch or mutation is a single attempt; nothing retries on its own.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::ApiError;

/// The state of a query.
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, E>
type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T, String> + Send + Sync>;

/// Async query with cached-snapshot state management.
///
/// The snapshot held in `Success` is only ever mutated two ways: replaced
/// wholesale when a fetch completes, or adjusted locally via
/// [`Query::update_data`] (the optimistic-update hook).
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()`, `refetch()` or `invalidate()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      stale_time: Duration::from_secs(60),
    }
  }

  /// Set the stale time for this query.
  #[allow(dead_code)]
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Check if the data is stale (older than stale_time).
  pub fn is_stale(&self) -> bool {
    match &self.state {
      QueryState::Success(_) => self
        .fetched_at
        .map(|t| t.elapsed() > self.stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Mark the cached snapshot stale and refetch, so the next observed read
  /// reflects authoritative server state.
  pub fn invalidate(&mut self) {
    self.fetched_at = None;
    self.refetch();
  }

  /// Apply a local mutation to the cached snapshot.
  ///
  /// No-op unless the query is in `Success`. The next completed fetch
  /// replaces the snapshot and reconciles whatever was changed here.
  pub fn update_data(&mut self, f: impl FnOnce(&mut T)) {
    if let QueryState::Success(data) = &mut self.state {
      f(data);
    }
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .finish_non_exhaustive()
  }
}

/// The state of a mutation.
///
/// Unlike queries, mutation errors stay typed: the caller branches on the
/// failure kind (conflict, not-found) rather than displaying it verbatim.
#[derive(Debug)]
pub enum MutationState<T> {
  /// Mutation has never run
  Idle,
  /// Mutation request is in flight
  Pending,
  /// Last run completed successfully
  Success(T),
  /// Last run failed
  Error(ApiError),
}

impl<T> MutationState<T> {
  pub fn is_pending(&self) -> bool {
    matches!(self, MutationState::Pending)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, MutationState::Success(_))
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type RunnerFn<T, I> = Box<dyn Fn(I) -> BoxFuture<T, ApiError> + Send + Sync>;

/// A single write operation against the backend.
///
/// `mutate(input)` starts a run; the owner calls `poll()` every tick and
/// gets `true` exactly once when the run settles, then inspects `state()`
/// to apply cache policy.
pub struct Mutation<T, I> {
  state: MutationState<T>,
  runner: RunnerFn<T, I>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
}

impl<T: Send + 'static, I> Mutation<T, I> {
  /// Create a mutation from a runner closure.
  pub fn new<F, Fut>(runner: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      runner: Box::new(move |input| Box::pin(runner(input))),
      receiver: None,
    }
  }

  pub fn state(&self) -> &MutationState<T> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    self.state.is_pending()
  }

  /// Start the mutation. Ignored while a previous run is still pending.
  pub fn mutate(&mut self, input: I) {
    if self.state.is_pending() {
      return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let future = (self.runner)(input);
    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(result);
    });
  }

  /// Poll for completion of a pending run.
  ///
  /// Returns `true` exactly once per run, when it settles into `Success`
  /// or `Error`.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = MutationState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = MutationState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = MutationState::Error(ApiError::Cancelled);
        self.receiver = None;
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Something went wrong".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Something went wrong"));
  }

  #[tokio::test]
  async fn test_query_stale() {
    let mut query = Query::new(|| async { Ok::<_, String>(42) }).with_stale_time(Duration::ZERO);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    // With zero stale time, should immediately be stale
    assert!(query.is_stale());
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    assert!(query.is_loading());

    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_refetch_cancels_pending() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Refetch should cancel the first and start a new one
    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    // Only the second fetch should have completed and been received
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_update_data_mutates_snapshot() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });
    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    query.update_data(|v| v.retain(|&n| n != 2));
    assert_eq!(query.data(), Some(&vec![1, 3]));
  }

  #[tokio::test]
  async fn test_update_data_noop_before_success() {
    let mut query: Query<Vec<i32>> = Query::new(|| async { Ok(vec![1]) });
    // Never fetched: nothing to mutate, nothing to panic on.
    query.update_data(|v| v.clear());
    assert!(query.data().is_none());
  }

  #[tokio::test]
  async fn test_invalidate_refetches() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move { Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst)) }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    query.invalidate();
    assert!(query.is_loading());
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_mutation_success_polls_once() {
    let mut mutation: Mutation<i32, i32> = Mutation::new(|n| async move { Ok(n * 2) });

    assert!(matches!(mutation.state(), MutationState::Idle));
    mutation.mutate(21);
    assert!(mutation.is_pending());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(mutation.poll());
    assert!(matches!(mutation.state(), MutationState::Success(42)));
    // Completion is reported exactly once.
    assert!(!mutation.poll());
  }

  #[tokio::test]
  async fn test_mutation_error() {
    let mut mutation: Mutation<(), ()> = Mutation::new(|_| async {
      Err(ApiError::Status {
        status: reqwest::StatusCode::CONFLICT,
        message: "already exists".to_string(),
      })
    });

    mutation.mutate(());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(mutation.poll());
    let err = mutation.state().error().unwrap();
    assert!(err.is_slug_conflict());
  }

  #[tokio::test]
  async fn test_mutate_while_pending_is_noop() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut mutation: Mutation<u32, ()> = Mutation::new(move |_| {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    mutation.mutate(());
    mutation.mutate(());
    tokio::time::sleep(Duration::from_millis(100)).await;
    mutation.poll();

    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
  }
}
