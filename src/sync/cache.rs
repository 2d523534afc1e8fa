//! Single-snapshot cache for one synchronized resource.

use std::time::{Duration, Instant};

/// The last successfully fetched value and the instant it was captured.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub value: T,
  pub captured_at: Instant,
}

impl<T> CacheEntry<T> {
  /// How long ago this snapshot was captured.
  pub fn age(&self) -> Duration {
    self.captured_at.elapsed()
  }
}

/// In-memory holder for at most one cached snapshot.
///
/// Owned exclusively by one controller. The entry is replaced wholesale on
/// every successful fetch, never partially updated, so `captured_at` is
/// monotonically non-decreasing over the controller's lifetime.
#[derive(Debug)]
pub struct CacheStore<T> {
  entry: Option<CacheEntry<T>>,
}

impl<T> CacheStore<T> {
  pub fn new() -> Self {
    Self { entry: None }
  }

  /// Get the cached snapshot, if any.
  pub fn read(&self) -> Option<&CacheEntry<T>> {
    self.entry.as_ref()
  }

  /// Unconditionally replace the snapshot with a value captured now.
  ///
  /// Returns the capture instant so callers can publish it alongside the
  /// value without re-reading the store.
  pub fn write(&mut self, value: T) -> Instant {
    let captured_at = Instant::now();
    self.entry = Some(CacheEntry { value, captured_at });
    captured_at
  }
}

impl<T> Default for CacheStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_store_misses() {
    let store: CacheStore<u32> = CacheStore::new();
    assert!(store.read().is_none());
  }

  #[test]
  fn test_write_overwrites_previous_entry() {
    let mut store = CacheStore::new();
    store.write(1);
    store.write(2);

    let entry = store.read().expect("entry should exist");
    assert_eq!(entry.value, 2);
  }

  #[test]
  fn test_captured_at_is_non_decreasing() {
    let mut store = CacheStore::new();
    let first = store.write(1);
    let second = store.write(2);

    assert!(second >= first);
    assert_eq!(store.read().map(|e| e.captured_at), Some(second));
  }
}
