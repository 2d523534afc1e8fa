//! Single-flight guard for fetch operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reentrancy flag ensuring at most one fetch is in flight per controller.
///
/// Losing the acquisition race means "skip this fetch attempt silently";
/// it is never an error.
#[derive(Debug)]
pub struct FlightGuard {
  in_flight: Arc<AtomicBool>,
}

impl FlightGuard {
  pub fn new() -> Self {
    Self {
      in_flight: Arc::new(AtomicBool::new(false)),
    }
  }

  /// Try to claim the in-flight slot.
  ///
  /// Returns `None` when another fetch already holds it. The returned
  /// permit releases the slot when dropped, so success, error, and
  /// cancellation paths all release.
  pub fn try_acquire(&self) -> Option<FlightPermit> {
    self
      .in_flight
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| FlightPermit {
        slot: Arc::clone(&self.in_flight),
      })
  }

  /// Whether a fetch currently holds the slot.
  pub fn is_in_flight(&self) -> bool {
    self.in_flight.load(Ordering::Acquire)
  }
}

impl Default for FlightGuard {
  fn default() -> Self {
    Self::new()
  }
}

/// Scoped claim on the in-flight slot; dropping it releases the guard.
#[derive(Debug)]
pub struct FlightPermit {
  slot: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
  fn drop(&mut self) {
    self.slot.store(false, Ordering::Release);
  }
}
