//! Periodic refresh timer.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Repeating timer that drives opportunistic refreshes while armed.
///
/// The first tick fires one full period after start; the initial fetch is
/// the controller's job, not the timer's. `stop()` and dropping both cancel
/// the task deterministically.
#[derive(Debug)]
pub struct SyncScheduler {
  handle: JoinHandle<()>,
}

impl SyncScheduler {
  /// Arm the timer, invoking `on_tick` every `period`.
  pub fn start<F, Fut>(period: Duration, mut on_tick: F) -> Self
  where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
  {
    let handle = tokio::spawn(async move {
      let mut ticker = interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first interval tick completes immediately; skip it.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        on_tick().await;
      }
    });

    Self { handle }
  }

  /// Cancel the timer task.
  pub fn stop(&self) {
    self.handle.abort();
  }
}

impl Drop for SyncScheduler {
  fn drop(&mut self) {
    self.handle.abort();
  }
}
