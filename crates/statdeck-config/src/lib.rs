//! # statdeck-config
//!
//! TOML configuration types, loading, and validation for statdeck.
//!
//! Single source of truth for `StatdeckConfig` and its sections.
//! Depends only on `statdeck-paths`.

mod defaults;
mod loading;
mod validation;

pub mod errors;
pub mod types;

// Public API re-exports
pub use defaults::MIN_REFRESH_INTERVAL_MS;
pub use errors::ConfigError;
pub use loading::{load_hierarchy, merge_configs};
pub use types::{BackendConfig, RefreshConfig, StatdeckConfig};
pub use validation::validate_config;

impl StatdeckConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
