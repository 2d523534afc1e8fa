//! Controller configuration.

use std::time::Duration;

/// Tuning knobs for a [`SyncController`](super::SyncController).
///
/// The defaults match what the storefront screens want: refresh every 30
/// seconds while mounted, serve cached data for up to a minute, and refetch
/// whenever the app returns to the foreground.
#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Arm the periodic refresh timer.
  pub auto_refresh: bool,
  /// Cadence of the periodic refresh.
  pub refresh_interval: Duration,
  /// React to app foreground transitions.
  pub enable_background_sync: bool,
  /// How long a cached snapshot is served without a blocking refetch.
  pub cache_time: Duration,
  /// Force a fetch on every foreground transition. When off, a transition
  /// only fetches once the focus floor has elapsed since the last attempt.
  pub revalidate_on_focus: bool,
  /// Serve a fresh cache hit immediately and refresh it in the background.
  pub stale_while_revalidate: bool,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      auto_refresh: true,
      refresh_interval: Duration::from_secs(30),
      enable_background_sync: true,
      cache_time: Duration::from_secs(60),
      revalidate_on_focus: true,
      stale_while_revalidate: true,
    }
  }
}

impl SyncOptions {
  pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
    self.auto_refresh = enabled;
    self
  }

  pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
    self.refresh_interval = interval;
    self
  }

  pub fn with_background_sync(mut self, enabled: bool) -> Self {
    self.enable_background_sync = enabled;
    self
  }

  pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
    self.cache_time = cache_time;
    self
  }

  pub fn with_revalidate_on_focus(mut self, enabled: bool) -> Self {
    self.revalidate_on_focus = enabled;
    self
  }

  pub fn with_stale_while_revalidate(mut self, enabled: bool) -> Self {
    self.stale_while_revalidate = enabled;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let options = SyncOptions::default();

    assert!(options.auto_refresh);
    assert_eq!(options.refresh_interval, Duration::from_secs(30));
    assert!(options.enable_background_sync);
    assert_eq!(options.cache_time, Duration::from_secs(60));
    assert!(options.revalidate_on_focus);
    assert!(options.stale_while_revalidate);
  }

  #[test]
  fn test_builder_setters() {
    let options = SyncOptions::default()
      .with_auto_refresh(false)
      .with_refresh_interval(Duration::from_secs(5))
      .with_stale_while_revalidate(false);

    assert!(!options.auto_refresh);
    assert_eq!(options.refresh_interval, Duration::from_secs(5));
    assert!(!options.stale_while_revalidate);
  }
}
