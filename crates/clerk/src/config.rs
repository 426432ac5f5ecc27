use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::records::IdStrategy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/extract-document";

pub const SERVER_URL_ENV: &str = "CLERK_SERVER_URL";
pub const STORAGE_DIR_ENV: &str = "CLERK_STORAGE_DIR";
pub const TIMEOUT_SECS_ENV: &str = "CLERK_TIMEOUT_SECS";
pub const ID_STRATEGY_ENV: &str = "CLERK_ID_STRATEGY";

/// Settings for the extraction client and the local record store
#[derive(Debug, Clone, PartialEq)]
pub struct ClerkConfig {
  /// Base URL of the extraction service (e.g., "http://localhost:3000")
  pub base_url: String,
  /// Path of the extraction endpoint relative to `base_url`
  pub endpoint_path: String,
  /// Directory the file-backed record store writes into
  pub storage_dir: PathBuf,
  /// Request timeout; `None` means no timeout beyond the HTTP client's own
  pub timeout_secs: Option<u64>,
  pub id_strategy: IdStrategy,
}

impl Default for ClerkConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
      storage_dir: default_storage_dir(),
      timeout_secs: None,
      id_strategy: IdStrategy::default(),
    }
  }
}

impl ClerkConfig {
  /// Defaults overlaid with any `CLERK_*` environment variables
  pub fn from_env() -> Self {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Same as [`Self::from_env`] but with an injectable variable source
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();

    let server = lookup(SERVER_URL_ENV);
    let storage_dir = lookup(STORAGE_DIR_ENV);
    config = config.with_overrides(server.as_deref(), storage_dir.as_deref().map(Path::new));
    config.timeout_secs = lookup(TIMEOUT_SECS_ENV)
      .and_then(|v| v.trim().parse::<u64>().ok())
      .filter(|secs| *secs > 0);
    if let Some(strategy) = lookup(ID_STRATEGY_ENV) {
      match strategy.parse() {
        Ok(strategy) => config.id_strategy = strategy,
        Err(e) => tracing::warn!("ignoring {ID_STRATEGY_ENV}: {e}"),
      }
    }

    config
  }

  /// Apply command-line style overrides; blank values are ignored
  pub fn with_overrides(mut self, server: Option<&str>, storage_dir: Option<&Path>) -> Self {
    if let Some(url) = server.filter(|v| !v.trim().is_empty()) {
      self.base_url = url.trim().to_string();
    }
    if let Some(dir) = storage_dir.filter(|d| !d.to_string_lossy().trim().is_empty()) {
      self.storage_dir = dir.to_path_buf();
    }
    self
  }

  /// Full URL of the extraction endpoint
  pub fn extraction_url(&self) -> String {
    format!(
      "{}/{}",
      self.base_url.trim_end_matches('/'),
      self.endpoint_path.trim_start_matches('/')
    )
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_secs.map(Duration::from_secs)
  }
}

fn default_storage_dir() -> PathBuf {
  dirs::data_dir().map(|dir| dir.join("clerk")).unwrap_or_else(|| PathBuf::from(".clerk"))
}
