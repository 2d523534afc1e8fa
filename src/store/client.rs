//! Storefront API client.

use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::session::Credential;

use super::types::{AccountStats, Notification, Order};

/// Thin typed client for the storefront backend.
///
/// Each method performs exactly one logical round-trip, presenting the
/// session credential as a bearer token. Retry and caching policy belong to
/// the layers around it.
#[derive(Debug, Clone)]
pub struct StoreClient {
  http: reqwest::Client,
  base_url: Url,
}

impl StoreClient {
  pub fn new(config: &Config) -> Result<Self> {
    let raw = &config.api.base_url;
    let mut base_url = Url::parse(raw).map_err(|e| eyre!("Invalid API base URL {}: {}", raw, e))?;

    // Url::join treats a path without a trailing slash as a file component
    // and would drop it.
    if !base_url.path().ends_with('/') {
      base_url.set_path(&format!("{}/", base_url.path()));
    }

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// Fetch the current account's orders.
  pub async fn orders(&self, credential: &Credential) -> Result<Vec<Order>> {
    self.get(credential, "orders").await
  }

  /// Fetch the current account's notifications.
  pub async fn notifications(&self, credential: &Credential) -> Result<Vec<Notification>> {
    self.get(credential, "notifications").await
  }

  /// Fetch aggregate account statistics.
  pub async fn account_stats(&self, credential: &Credential) -> Result<AccountStats> {
    self.get(credential, "account/stats").await
  }

  async fn get<T: DeserializeOwned>(&self, credential: &Credential, path: &str) -> Result<T> {
    let url = self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))?;

    let response = self
      .http
      .get(url.clone())
      .bearer_auth(credential.token())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response from {}: {}", url, e))
  }
}
