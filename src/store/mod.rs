//! Storefront API surface: typed client, payload types, and the synced
//! facade the screens read from.

mod client;
mod synced;
pub mod types;

pub use client::StoreClient;
pub use synced::SyncedStore;
