use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sync::SyncOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the storefront backend, e.g. "https://api.shopsync.example/v1/"
  pub base_url: String,
}

/// Sync tuning knobs; anything omitted falls back to the controller defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
  pub auto_refresh: Option<bool>,
  pub refresh_interval_secs: Option<u64>,
  pub enable_background_sync: Option<bool>,
  pub cache_time_secs: Option<u64>,
  pub revalidate_on_focus: Option<bool>,
  pub stale_while_revalidate: Option<bool>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopsync/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/shopsync/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("shopsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Controller options with the file's overrides applied.
  pub fn sync_options(&self) -> SyncOptions {
    let mut options = SyncOptions::default();

    if let Some(enabled) = self.sync.auto_refresh {
      options.auto_refresh = enabled;
    }
    if let Some(secs) = self.sync.refresh_interval_secs {
      options.refresh_interval = Duration::from_secs(secs);
    }
    if let Some(enabled) = self.sync.enable_background_sync {
      options.enable_background_sync = enabled;
    }
    if let Some(secs) = self.sync.cache_time_secs {
      options.cache_time = Duration::from_secs(secs);
    }
    if let Some(enabled) = self.sync.revalidate_on_focus {
      options.revalidate_on_focus = enabled;
    }
    if let Some(enabled) = self.sync.stale_while_revalidate {
      options.stale_while_revalidate = enabled;
    }

    options
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let yaml = "api:\n  base_url: https://api.shopsync.example/v1/\n";

    let config: Config = serde_yaml::from_str(yaml).expect("config should parse");
    assert_eq!(config.api.base_url, "https://api.shopsync.example/v1/");

    // No sync section: controller defaults apply.
    let options = config.sync_options();
    assert_eq!(options.refresh_interval, Duration::from_secs(30));
    assert_eq!(options.cache_time, Duration::from_secs(60));
  }

  #[test]
  fn test_sync_overrides_apply() {
    let yaml = "\
api:
  base_url: https://api.shopsync.example/v1/
sync:
  auto_refresh: false
  refresh_interval_secs: 120
  stale_while_revalidate: false
";

    let config: Config = serde_yaml::from_str(yaml).expect("config should parse");
    let options = config.sync_options();

    assert!(!options.auto_refresh);
    assert_eq!(options.refresh_interval, Duration::from_secs(120));
    assert!(!options.stale_while_revalidate);
    // Untouched knobs keep their defaults.
    assert!(options.revalidate_on_focus);
  }

  #[test]
  fn test_missing_explicit_path_errors() {
    let result = Config::load(Some(Path::new("/nonexistent/shopsync.yaml")));
    assert!(result.is_err());
  }
}
