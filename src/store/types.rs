//! Serde-deserializable types matching storefront API responses.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A line item within an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub product_id: String,
  pub name: String,
  pub quantity: u32,
  /// Unit price in minor currency units.
  pub unit_price: i64,
}

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
}

/// A placed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub status: OrderStatus,
  /// Total in minor currency units.
  pub total: i64,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub items: Vec<OrderItem>,
}

/// An account notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub body: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub read: bool,
}

/// Aggregate account statistics shown on the profile screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
  pub order_count: u32,
  pub review_count: u32,
  /// Lifetime spend in minor currency units.
  pub total_spent: i64,
}
