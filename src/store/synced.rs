//! Storefront client with synchronized, cached reads.

use crate::session::SessionHandle;
use crate::sync::{AppLifecycle, SyncController, SyncOptions};

use super::client::StoreClient;
use super::types::{AccountStats, Notification, Order};

/// Wraps a [`StoreClient`] with one [`SyncController`] per resource.
///
/// The controllers are fully independent: each caches, refreshes, and fails
/// on its own, and they may fetch concurrently without interference.
pub struct SyncedStore {
  orders: SyncController<Vec<Order>>,
  notifications: SyncController<Vec<Notification>>,
  stats: SyncController<AccountStats>,
}

impl SyncedStore {
  /// Mount a controller for every resource with shared options.
  pub fn new(
    client: StoreClient,
    session: &SessionHandle,
    lifecycle: &AppLifecycle,
    options: SyncOptions,
  ) -> Self {
    let orders = {
      let client = client.clone();
      SyncController::new(
        move |credential| {
          let client = client.clone();
          async move { client.orders(&credential).await.map_err(|e| e.to_string()) }
        },
        session.watch(),
        Some(lifecycle),
        options.clone(),
      )
    };

    let notifications = {
      let client = client.clone();
      SyncController::new(
        move |credential| {
          let client = client.clone();
          async move {
            client
              .notifications(&credential)
              .await
              .map_err(|e| e.to_string())
          }
        },
        session.watch(),
        Some(lifecycle),
        options.clone(),
      )
    };

    let stats = SyncController::new(
      move |credential| {
        let client = client.clone();
        async move {
          client
            .account_stats(&credential)
            .await
            .map_err(|e| e.to_string())
        }
      },
      session.watch(),
      Some(lifecycle),
      options,
    );

    Self {
      orders,
      notifications,
      stats,
    }
  }

  pub fn orders(&self) -> &SyncController<Vec<Order>> {
    &self.orders
  }

  pub fn notifications(&self) -> &SyncController<Vec<Notification>> {
    &self.notifications
  }

  pub fn stats(&self) -> &SyncController<AccountStats> {
    &self.stats
  }

  /// Force-refresh every resource; resolves when all have settled.
  pub async fn refresh_all(&self) {
    tokio::join!(
      self.orders.refresh(),
      self.notifications.refresh(),
      self.stats.refresh(),
    );
  }
}
