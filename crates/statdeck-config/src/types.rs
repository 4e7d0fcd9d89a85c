//! Configuration type definitions for statdeck.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "https://search.internal:8443"
//! token_env = "STATDECK_TOKEN"
//! request_timeout_ms = 15000
//!
//! [refresh]
//! auto_refresh = true
//! interval_ms = 30000
//! max_age_ms = 60000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults;

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.statdeck/config.toml`
/// 2. Project config: `./.statdeck/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatdeckConfig {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Refresh and staleness settings
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Backend connection configuration.
///
/// Fields are `Option<T>` to support proper config hierarchy merging:
/// only explicitly-set values override lower-priority configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the stats service.
    /// Default: "http://localhost:8000"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the access token.
    /// Default: "STATDECK_TOKEN"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Outer timeout for a single backend call, in milliseconds.
    /// Default: 15000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl BackendConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(defaults::DEFAULT_BASE_URL)
    }

    pub fn token_env(&self) -> &str {
        self.token_env.as_deref().unwrap_or(defaults::DEFAULT_TOKEN_ENV)
    }

    /// Read the access token from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn access_token(&self) -> Option<String> {
        std::env::var(self.token_env())
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(defaults::DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            base_url: override_config
                .base_url
                .clone()
                .or_else(|| base.base_url.clone()),
            token_env: override_config
                .token_env
                .clone()
                .or_else(|| base.token_env.clone()),
            request_timeout_ms: override_config
                .request_timeout_ms
                .or(base.request_timeout_ms),
        }
    }
}

/// Refresh configuration.
///
/// Controls the auto-refresh timer and the staleness threshold the timer
/// checks resources against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Whether auto-refresh starts armed.
    /// Default: false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh: Option<bool>,

    /// Auto-refresh period in milliseconds. Must be >= 10000.
    /// Default: 30000
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    /// Maximum age of a resource before a tick re-fetches it.
    /// Default: unset, so the threshold follows the current refresh interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_ms: Option<u64>,
}

impl RefreshConfig {
    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh.unwrap_or(false)
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
            .unwrap_or(defaults::DEFAULT_REFRESH_INTERVAL_MS)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms())
    }

    /// Explicit staleness threshold, if one is configured.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_ms.map(Duration::from_millis)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            auto_refresh: override_config.auto_refresh.or(base.auto_refresh),
            interval_ms: override_config.interval_ms.or(base.interval_ms),
            max_age_ms: override_config.max_age_ms.or(base.max_age_ms),
        }
    }
}
