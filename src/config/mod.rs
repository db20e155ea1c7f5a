//! Runtime configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::api::endpoints::{Endpoints, DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL};
use crate::auth::FileConfigStore;

/// Minutes between automatic package checks.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 30;

pub const ENV_AUTH_BASE_URL: &str = "LIVLY_AUTH_BASE_URL";
pub const ENV_API_BASE_URL: &str = "LIVLY_API_BASE_URL";
pub const ENV_POLL_INTERVAL_MINUTES: &str = "LIVLY_POLL_INTERVAL_MINUTES";
pub const ENV_DATA_DIR: &str = "LIVLY_DATA_DIR";

/// Layered configuration for the integration.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use livly::config::LivlyConfig;
///
/// let config = LivlyConfig::default().with_poll_interval(Duration::from_secs(600));
/// assert_eq!(config.poll_interval, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivlyConfig {
    pub auth_base_url: String,
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub data_dir: PathBuf,
}

impl Default for LivlyConfig {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_MINUTES * 60),
            data_dir: default_data_dir(),
        }
    }
}

impl LivlyConfig {
    /// Defaults overridden by `LIVLY_*` environment variables (and `.env`, if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `LIVLY_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_AUTH_BASE_URL) {
            config.auth_base_url = url;
        }
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            config.api_base_url = url;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MINUTES) {
            match raw.trim().parse::<u64>() {
                Ok(minutes) if minutes > 0 => {
                    config.poll_interval = minutes_to_interval(minutes);
                }
                _ => warn!(
                    variable = ENV_POLL_INTERVAL_MINUTES,
                    value = %raw,
                    "Ignoring invalid poll interval"
                ),
            }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            auth_base_url: self.auth_base_url.clone(),
            api_base_url: self.api_base_url.clone(),
        }
    }

    /// File-backed store rooted at [`Self::data_dir`].
    pub fn file_store(&self) -> FileConfigStore {
        FileConfigStore::new(self.data_dir.clone())
    }
}

/// Poll interval for a whole number of minutes, saturating on overflow.
pub fn minutes_to_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".livly"))
        .unwrap_or_else(|| PathBuf::from(".livly"))
}
