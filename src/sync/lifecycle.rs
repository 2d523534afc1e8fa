//! App foreground/background transitions and the focus refresh policy.

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Minimum gap since the last fetch attempt before a foreground transition
/// triggers an opportunistic refresh when `revalidate_on_focus` is off.
pub const FOCUS_REFRESH_FLOOR: Duration = Duration::from_secs(60);

/// Host application lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTransition {
  Foreground,
  Background,
}

/// Foreground/background transition hub.
///
/// The host environment owns one of these and reports transitions through
/// [`foreground`](Self::foreground) / [`background`](Self::background);
/// controllers subscribe and react. The sync core itself carries no
/// dependency on any particular host runtime's notifier.
#[derive(Debug, Clone)]
pub struct AppLifecycle {
  tx: broadcast::Sender<AppTransition>,
}

impl AppLifecycle {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(16);
    Self { tx }
  }

  /// Report that the app became active.
  pub fn foreground(&self) {
    // No subscribers is fine; send only fails when nobody listens.
    let _ = self.tx.send(AppTransition::Foreground);
  }

  /// Report that the app went inactive.
  pub fn background(&self) {
    let _ = self.tx.send(AppTransition::Background);
  }

  /// Subscribe to transitions.
  pub fn subscribe(&self) -> broadcast::Receiver<AppTransition> {
    self.tx.subscribe()
  }
}

impl Default for AppLifecycle {
  fn default() -> Self {
    Self::new()
  }
}

/// What a foreground transition should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
  /// Force a fetch regardless of cache age.
  Force,
  /// Opportunistic fetch, subject to the normal cache policy.
  Refresh,
  /// Too soon since the last attempt; do nothing.
  Skip,
}

/// Decide how to react to a transition to the foreground.
///
/// `since_last_attempt` is the elapsed time since the last fetch attempt;
/// `None` means no attempt was ever made.
pub fn focus_action(revalidate_on_focus: bool, since_last_attempt: Option<Duration>) -> FocusAction {
  if revalidate_on_focus {
    return FocusAction::Force;
  }

  match since_last_attempt {
    Some(elapsed) if elapsed <= FOCUS_REFRESH_FLOOR => FocusAction::Skip,
    _ => FocusAction::Refresh,
  }
}

/// Per-controller subscription to foreground transitions.
///
/// Invokes the handler on every transition to the foreground; dropping or
/// stopping the observer unsubscribes deterministically.
#[derive(Debug)]
pub struct LifecycleObserver {
  handle: JoinHandle<()>,
}

impl LifecycleObserver {
  pub fn start<F, Fut>(lifecycle: &AppLifecycle, mut on_foreground: F) -> Self
  where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
  {
    let mut rx = lifecycle.subscribe();
    let handle = tokio::spawn(async move {
      loop {
        match rx.recv().await {
          Ok(AppTransition::Foreground) => on_foreground().await,
          Ok(AppTransition::Background) => {}
          // Missed transitions collapse into the next one we do see.
          Err(broadcast::error::RecvError::Lagged(_)) => continue,
          Err(broadcast::error::RecvError::Closed) => break,
        }
      }
    });

    Self { handle }
  }

  /// Unsubscribe and stop the observer task.
  pub fn stop(&self) {
    self.handle.abort();
  }
}

impl Drop for LifecycleObserver {
  fn drop(&mut self) {
    self.handle.abort();
  }
}
