//! Deferred, cancellable navigation for the redirect flow.
//!
//! Once a slug resolves, the redirect view gives the user a moment to read
//! the destination before the browser opens. The schedule is a spawned
//! sleep that fires a callback exactly once; dropping the handle aborts
//! the task, so tearing the view down before the deadline guarantees no
//! late navigation.

use std::time::Duration;

use tokio::task::JoinHandle;

/// A one-shot timer driving the automatic navigation.
///
/// Holds the task handle for its lifetime; `Drop` is the cancellation
/// path. There is no way to re-arm a fired or cancelled schedule — make a
/// new one.
pub struct DeferredNavigation {
  task: JoinHandle<()>,
}

impl DeferredNavigation {
  /// Schedule `on_fire` to run once after `delay`.
  ///
  /// The callback runs on the runtime, not on the UI thread; send
  /// something pollable (a channel) if the UI must observe the firing.
  pub fn schedule<F>(delay: Duration, on_fire: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    let task = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      on_fire();
    });

    Self { task }
  }

  /// Cancel the schedule explicitly. Equivalent to dropping the handle.
  pub fn cancel(self) {
    drop(self);
  }
}

impl Drop for DeferredNavigation {
  fn drop(&mut self) {
    self.task.abort();
  }
}
