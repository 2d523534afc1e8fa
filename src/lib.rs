//! Client-side data layer for the Shopsync mobile storefront.
//!
//! The storefront's screens, navigation, and forms live in the host app;
//! this crate owns what sits between them and the backend: session
//! credential plumbing, a typed API client, and the data synchronization
//! core that keeps per-resource snapshots fresh — caching, background
//! revalidation, periodic refresh, foreground-triggered refresh, and a
//! single-flight guarantee per resource.
//!
//! # Quick start
//!
//! ```ignore
//! use shopsync::{AppLifecycle, Config, Credential, SessionHandle, StoreClient, SyncedStore};
//!
//! let config = Config::load(None)?;
//! let session = SessionHandle::new();
//! let lifecycle = AppLifecycle::new();
//! let client = StoreClient::new(&config)?;
//! let store = SyncedStore::new(client, &session, &lifecycle, config.sync_options());
//!
//! // Signing in makes the controllers fetch; the host relays lifecycle events.
//! session.sign_in(Credential::new(token));
//! lifecycle.foreground();
//!
//! // Screens read snapshots and can force a pull-to-refresh.
//! let orders = store.orders().value();
//! store.orders().refresh().await;
//! ```

pub mod config;
pub mod session;
pub mod store;
pub mod sync;

pub use config::Config;
pub use session::{Credential, SessionHandle};
pub use store::{StoreClient, SyncedStore};
pub use sync::{AppLifecycle, AppTransition, SyncController, SyncOptions, SyncState};
