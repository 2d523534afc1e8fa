//! Per-resource synchronization controller.
//!
//! A `SyncController<T>` wraps a caller-supplied "fetch this resource for
//! the current session" operation with caching, background revalidation,
//! periodic refresh, and foreground-triggered refresh, while guaranteeing
//! at most one in-flight fetch at a time.
//!
//! # Example
//!
//! ```ignore
//! let client = store_client.clone();
//! let orders = SyncController::new(
//!     move |credential| {
//!         let client = client.clone();
//!         async move { client.orders(&credential).await.map_err(|e| e.to_string()) }
//!     },
//!     session.watch(),
//!     Some(&lifecycle),
//!     SyncOptions::default(),
//! );
//!
//! // Screens read snapshots...
//! if let Some(orders) = orders.value() {
//!     render(orders);
//! }
//!
//! // ...and pull-to-refresh awaits an explicit refresh.
//! orders.refresh().await;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::Credential;

use super::cache::CacheStore;
use super::guard::{FlightGuard, FlightPermit};
use super::lifecycle::{focus_action, AppLifecycle, FocusAction, LifecycleObserver};
use super::options::SyncOptions;
use super::scheduler::SyncScheduler;

/// Externally observable projection of the cache and in-flight status.
#[derive(Debug, Clone)]
pub struct SyncState<T> {
  /// Last successfully fetched value. `None` only before the first success.
  pub value: Option<T>,
  /// A blocking fetch is in progress.
  pub loading: bool,
  /// Message of the last blocking fetch failure, if any.
  pub error: Option<String>,
  /// Capture instant of the last successful fetch.
  pub last_updated: Option<Instant>,
}

impl<T> SyncState<T> {
  fn empty() -> Self {
    Self {
      value: None,
      loading: false,
      error: None,
      last_updated: None,
    }
  }
}

/// Fetches one resource for the given credential.
///
/// Expected to perform exactly one logical round-trip and resolve with the
/// resource or a descriptive failure message.
pub type FetchBinding<T> = Box<dyn Fn(Credential) -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

// Writers replace state fields wholesale, so a poisoned lock still holds a
// coherent snapshot; recover it instead of propagating the panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the controller handle and its spawned tasks.
struct Shared<T> {
  fetch: FetchBinding<T>,
  options: SyncOptions,
  credential: watch::Receiver<Option<Credential>>,
  cache: Mutex<CacheStore<T>>,
  state: Mutex<SyncState<T>>,
  guard: FlightGuard,
  last_attempt: Mutex<Option<Instant>>,
  disposed: AtomicBool,
}

impl<T: Clone + Send + 'static> Shared<T> {
  fn current_credential(&self) -> Option<Credential> {
    self.credential.borrow().clone()
  }

  /// Apply a state change, unless the controller was disposed — a late
  /// completion publishing against a discarded controller is a no-op.
  fn publish(&self, update: impl FnOnce(&mut SyncState<T>)) {
    if self.disposed.load(Ordering::Acquire) {
      return;
    }
    update(&mut lock(&self.state));
  }

  /// Serve from cache or fetch, per the freshness policy.
  ///
  /// No timeout is applied to the fetch-binding: a call that never resolves
  /// holds the single-flight slot and starves all future fetch attempts for
  /// this controller.
  async fn ensure_fresh(self: Arc<Self>, force: bool) {
    if self.disposed.load(Ordering::Acquire) {
      return;
    }
    let Some(credential) = self.current_credential() else {
      debug!("no credential present, skipping fetch");
      return;
    };

    if !force {
      let fresh = lock(&self.cache)
        .read()
        .filter(|entry| entry.age() < self.options.cache_time)
        .map(|entry| (entry.value.clone(), entry.captured_at));

      if let Some((value, captured_at)) = fresh {
        self.publish(|state| {
          state.value = Some(value);
          state.last_updated = Some(captured_at);
        });

        if self.options.stale_while_revalidate {
          if let Some(permit) = self.guard.try_acquire() {
            tokio::spawn(Arc::clone(&self).revalidate(credential, permit));
          }
        }
        return;
      }
    }

    // Cache miss, stale entry, or forced: blocking fetch.
    let Some(permit) = self.guard.try_acquire() else {
      debug!("fetch already in flight, skipping attempt");
      return;
    };

    *lock(&self.last_attempt) = Some(Instant::now());
    self.publish(|state| {
      state.loading = true;
      state.error = None;
    });

    match (self.fetch)(credential).await {
      Ok(value) => {
        let captured_at = lock(&self.cache).write(value.clone());
        self.publish(|state| {
          state.value = Some(value);
          state.last_updated = Some(captured_at);
          state.error = None;
          state.loading = false;
        });
      }
      Err(message) => {
        warn!("fetch failed: {}", message);
        self.publish(|state| {
          state.error = Some(message);
          state.loading = false;
        });
      }
    }

    drop(permit);
  }

  /// Background revalidation of a still-fresh cache hit.
  ///
  /// Failures are swallowed at this boundary: the caller is already looking
  /// at valid cached data. Never touches `loading` or `error`.
  async fn revalidate(self: Arc<Self>, credential: Credential, permit: FlightPermit) {
    *lock(&self.last_attempt) = Some(Instant::now());

    match (self.fetch)(credential).await {
      Ok(value) => {
        let captured_at = lock(&self.cache).write(value.clone());
        self.publish(|state| {
          state.value = Some(value);
          state.last_updated = Some(captured_at);
        });
      }
      Err(message) => {
        debug!("background revalidation failed: {}", message);
      }
    }

    drop(permit);
  }

  async fn on_foreground(self: Arc<Self>) {
    let last_attempt = *lock(&self.last_attempt);
    let since_last_attempt = last_attempt.map(|at| at.elapsed());

    match focus_action(self.options.revalidate_on_focus, since_last_attempt) {
      FocusAction::Force => self.ensure_fresh(true).await,
      FocusAction::Refresh => self.ensure_fresh(false).await,
      FocusAction::Skip => {}
    }
  }

  /// React to credential changes: a new present credential re-triggers the
  /// initial-fetch lifecycle (sign-in, account switch). A credential going
  /// absent needs no action here; every fetch path is gated on presence.
  async fn watch_credential(self: Arc<Self>) {
    let mut rx = self.credential.clone();
    loop {
      if rx.changed().await.is_err() {
        break;
      }
      let present = rx.borrow_and_update().is_some();
      if present {
        Arc::clone(&self).ensure_fresh(true).await;
      }
    }
  }
}

/// Keeps one resource's snapshot fresh for the current session.
///
/// Composes the cache, single-flight guard, refresh timer, and lifecycle
/// observer behind a small read surface. Mount one controller per resource;
/// controllers are fully independent and may fetch concurrently.
///
/// Must be constructed within a Tokio runtime.
pub struct SyncController<T> {
  shared: Arc<Shared<T>>,
  scheduler: Option<SyncScheduler>,
  observer: Option<LifecycleObserver>,
  watcher: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + 'static> SyncController<T> {
  /// Mount a controller: performs a credential-gated initial fetch, arms the
  /// periodic refresh timer, subscribes to foreground transitions, and
  /// watches the session for credential changes.
  pub fn new<F, Fut>(
    fetch: F,
    credential: watch::Receiver<Option<Credential>>,
    lifecycle: Option<&AppLifecycle>,
    options: SyncOptions,
  ) -> Self
  where
    F: Fn(Credential) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let fetch: FetchBinding<T> = Box::new(move |credential| Box::pin(fetch(credential)));

    let shared = Arc::new(Shared {
      fetch,
      options: options.clone(),
      credential,
      cache: Mutex::new(CacheStore::new()),
      state: Mutex::new(SyncState::empty()),
      guard: FlightGuard::new(),
      last_attempt: Mutex::new(None),
      disposed: AtomicBool::new(false),
    });

    // Initial fetch; a no-op while signed out.
    tokio::spawn(Arc::clone(&shared).ensure_fresh(false));

    let scheduler = if options.auto_refresh {
      let shared = Arc::clone(&shared);
      Some(SyncScheduler::start(options.refresh_interval, move || {
        Arc::clone(&shared).ensure_fresh(false)
      }))
    } else {
      None
    };

    let observer = match lifecycle {
      Some(lifecycle) if options.enable_background_sync => {
        let shared = Arc::clone(&shared);
        Some(LifecycleObserver::start(lifecycle, move || {
          Arc::clone(&shared).on_foreground()
        }))
      }
      _ => None,
    };

    let watcher = tokio::spawn(Arc::clone(&shared).watch_credential());

    Self {
      shared,
      scheduler,
      observer,
      watcher: Some(watcher),
    }
  }

  /// Snapshot of the current sync state.
  pub fn state(&self) -> SyncState<T> {
    lock(&self.shared.state).clone()
  }

  /// Last successfully fetched value, if any.
  pub fn value(&self) -> Option<T> {
    lock(&self.shared.state).value.clone()
  }

  /// Whether a blocking fetch is in progress.
  pub fn is_loading(&self) -> bool {
    lock(&self.shared.state).loading
  }

  /// Message of the last blocking fetch failure, if any.
  pub fn error(&self) -> Option<String> {
    lock(&self.shared.state).error.clone()
  }

  /// Capture instant of the last successful fetch.
  pub fn last_updated(&self) -> Option<Instant> {
    lock(&self.shared.state).last_updated
  }

  /// Serve from cache or fetch, per the freshness policy.
  pub async fn ensure_fresh(&self, force: bool) {
    Arc::clone(&self.shared).ensure_fresh(force).await;
  }

  /// Force a refresh and wait for it to settle.
  ///
  /// Always resolves; a failure is communicated solely through
  /// [`error`](Self::error), never by rejecting.
  pub async fn refresh(&self) {
    Arc::clone(&self.shared).ensure_fresh(true).await;
  }
}

impl<T> SyncController<T> {
  /// Tear down the timer, lifecycle subscription, and credential watcher.
  ///
  /// Every subsequent operation is a no-op. An in-flight fetch-binding call
  /// is not cancelled, but its late completion is dropped.
  pub fn dispose(&mut self) {
    self.shared.disposed.store(true, Ordering::Release);
    if let Some(scheduler) = self.scheduler.take() {
      scheduler.stop();
    }
    if let Some(observer) = self.observer.take() {
      observer.stop();
    }
    if let Some(watcher) = self.watcher.take() {
      watcher.abort();
    }
  }
}

impl<T> Drop for SyncController<T> {
  fn drop(&mut self) {
    self.dispose();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::SessionHandle;
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;

  /// A session that already holds a credential.
  fn signed_in_session() -> SessionHandle {
    let session = SessionHandle::new();
    session.sign_in(Credential::new("token"));
    session
  }

  /// Options with all timers/subscriptions off, so tests drive everything.
  fn manual_options() -> SyncOptions {
    SyncOptions::default()
      .with_auto_refresh(false)
      .with_background_sync(false)
  }

  /// Fetch-binding that returns how many times it has been invoked.
  fn counting_fetcher(
    calls: Arc<AtomicUsize>,
  ) -> impl Fn(Credential) -> BoxFuture<'static, Result<usize, String>> + Send + Sync {
    move |_credential| {
      let calls = calls.clone();
      let fut: BoxFuture<'static, Result<usize, String>> =
        Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) });
      fut
    }
  }

  #[tokio::test]
  async fn test_initial_fetch_populates_state() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller =
      SyncController::new(counting_fetcher(calls.clone()), session.watch(), None, manual_options());

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.value(), Some(1));
    assert!(controller.last_updated().is_some());
    assert!(controller.error().is_none());
    assert!(!controller.is_loading());
  }

  #[tokio::test]
  async fn test_fresh_cache_hit_serves_without_fetch() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      None,
      manual_options().with_stale_while_revalidate(false),
    );

    tokio::time::sleep(Duration::from_millis(30)).await;
    controller.ensure_fresh(false).await;
    controller.ensure_fresh(false).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.value(), Some(1));
  }

  #[tokio::test]
  async fn test_stale_cache_triggers_exactly_one_refetch() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      None,
      manual_options()
        .with_cache_time(Duration::from_millis(30))
        .with_stale_while_revalidate(false),
    );

    tokio::time::sleep(Duration::from_millis(60)).await;
    controller.ensure_fresh(false).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(controller.value(), Some(2));
  }

  #[tokio::test]
  async fn test_swr_serves_cached_value_and_revalidates_in_background() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let controller = SyncController::new(
      move |_credential| {
        let calls = counter.clone();
        async move {
          let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
          if call > 1 {
            // Keep background revalidations observable mid-flight.
            tokio::time::sleep(Duration::from_millis(30)).await;
          }
          Ok(call)
        }
      },
      session.watch(),
      None,
      manual_options(),
    );

    tokio::time::sleep(Duration::from_millis(30)).await;
    controller.ensure_fresh(false).await;

    // Served from cache immediately, without waiting on the revalidation.
    assert_eq!(controller.value(), Some(1));
    assert!(!controller.is_loading());

    // Exactly one background fetch starts, and it never sets loading.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!controller.is_loading());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.value(), Some(2));
    assert!(!controller.is_loading());
  }

  #[tokio::test]
  async fn test_concurrent_refreshes_single_flight() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let controller = SyncController::new(
      move |_credential| {
        let calls = counter.clone();
        async move {
          tokio::time::sleep(Duration::from_millis(40)).await;
          Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
        }
      },
      session.watch(),
      None,
      manual_options(),
    );

    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Two overlapping forced refreshes: only the first may fetch.
    tokio::join!(controller.refresh(), controller.refresh());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_fetch_failure_preserves_cached_value() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let controller = SyncController::new(
      move |_credential| {
        let calls = counter.clone();
        async move {
          if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(5)
          } else {
            Err("backend unavailable".to_string())
          }
        }
      },
      session.watch(),
      None,
      manual_options(),
    );

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(controller.value(), Some(5));

    controller.refresh().await;

    assert_eq!(controller.value(), Some(5));
    assert_eq!(controller.error(), Some("backend unavailable".to_string()));
    assert!(!controller.is_loading());
  }

  #[tokio::test]
  async fn test_blocking_fetch_sets_loading_and_clears_error() {
    let session = signed_in_session();
    let controller = SyncController::new(
      |_credential| async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        Ok(1)
      },
      session.watch(),
      None,
      manual_options(),
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(controller.is_loading());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!controller.is_loading());
    assert!(controller.error().is_none());
  }

  #[tokio::test]
  async fn test_dispose_halts_all_scheduling() {
    let session = signed_in_session();
    let lifecycle = AppLifecycle::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      Some(&lifecycle),
      SyncOptions::default()
        .with_refresh_interval(Duration::from_millis(20))
        .with_cache_time(Duration::ZERO),
    );

    tokio::time::sleep(Duration::from_millis(70)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);

    controller.dispose();
    let seen = calls.load(Ordering::SeqCst);

    lifecycle.foreground();
    tokio::time::sleep(Duration::from_millis(70)).await;

    assert_eq!(calls.load(Ordering::SeqCst), seen);
  }

  #[tokio::test]
  async fn test_refresh_after_dispose_is_noop() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut controller =
      SyncController::new(counting_fetcher(calls.clone()), session.watch(), None, manual_options());

    tokio::time::sleep(Duration::from_millis(30)).await;
    controller.dispose();
    controller.refresh().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_foreground_forces_fetch_on_fresh_cache() {
    let session = signed_in_session();
    let lifecycle = AppLifecycle::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      Some(&lifecycle),
      SyncOptions::default().with_auto_refresh(false),
    );

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Cache is fresh (age ~0) but revalidate_on_focus forces anyway.
    lifecycle.foreground();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(controller.value(), Some(2));
  }

  #[tokio::test]
  async fn test_foreground_floor_skips_recent_attempt() {
    let session = signed_in_session();
    let lifecycle = AppLifecycle::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let _controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      Some(&lifecycle),
      SyncOptions::default()
        .with_auto_refresh(false)
        .with_revalidate_on_focus(false),
    );

    tokio::time::sleep(Duration::from_millis(30)).await;
    lifecycle.foreground();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // The initial attempt was milliseconds ago, well inside the floor.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_no_credential_suspends_fetching() {
    let session = SessionHandle::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      None,
      SyncOptions::default().with_refresh_interval(Duration::from_millis(20)),
    );

    tokio::time::sleep(Duration::from_millis(70)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(controller.value().is_none());

    // Sign-in re-triggers the initial-fetch lifecycle.
    session.sign_in(Credential::new("token"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(controller.value().is_some());
  }

  #[tokio::test]
  async fn test_credential_change_forces_refetch() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller =
      SyncController::new(counting_fetcher(calls.clone()), session.watch(), None, manual_options());

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    session.sign_in(Credential::new("another-account"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(controller.value(), Some(2));
  }

  #[tokio::test]
  async fn test_fresh_hit_then_stale_blocking_fetch() {
    let session = signed_in_session();
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = SyncController::new(
      counting_fetcher(calls.clone()),
      session.watch(),
      None,
      manual_options().with_cache_time(Duration::from_millis(60)),
    );

    // Initial fetch.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(controller.value(), Some(1));

    // Within cache_time: served from cache plus one background fetch.
    controller.ensure_fresh(false).await;
    assert_eq!(controller.value(), Some(1));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Past cache_time: the next call blocks on a fetch and returns fresh data.
    tokio::time::sleep(Duration::from_millis(80)).await;
    controller.ensure_fresh(false).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(controller.value(), Some(3));
  }
}
