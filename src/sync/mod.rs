//! Client-side data synchronization core.
//!
//! Wraps an arbitrary "fetch this resource for the current session"
//! operation with:
//! - a single in-memory snapshot per controller, served while fresh
//! - stale-while-revalidate background refreshes
//! - a periodic refresh timer
//! - foreground-transition refreshes
//! - a single-flight guarantee: at most one fetch in flight per controller
//!
//! Fetching is gated on a session credential observed reactively; while the
//! credential is absent every scheduled attempt is a no-op.

mod cache;
mod controller;
mod guard;
mod lifecycle;
mod options;
mod scheduler;

pub use cache::{CacheEntry, CacheStore};
pub use controller::{FetchBinding, SyncController, SyncState};
pub use guard::{FlightGuard, FlightPermit};
pub use lifecycle::{AppLifecycle, AppTransition, LifecycleObserver, FOCUS_REFRESH_FLOOR};
pub use options::SyncOptions;
pub use scheduler::SyncScheduler;
