//! Configuration validation logic.

use crate::defaults::MIN_REFRESH_INTERVAL_MS;
use crate::errors::ConfigError;
use crate::types::StatdeckConfig;

/// Validate a StatdeckConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - `backend.base_url` must be an http(s) URL
/// - `backend.request_timeout_ms` must be > 0
/// - `refresh.interval_ms` must be >= 10000
/// - `refresh.max_age_ms`, when set, must be > 0
pub fn validate_config(config: &StatdeckConfig) -> Result<(), ConfigError> {
    let base_url = config.backend.base_url();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "Invalid base_url '{}'. Must start with http:// or https://",
                base_url
            ),
        });
    }

    if config.backend.request_timeout_ms == Some(0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "request_timeout_ms must be > 0".to_string(),
        });
    }

    if config.refresh.interval_ms() < MIN_REFRESH_INTERVAL_MS {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "interval_ms must be >= {} (got {})",
                MIN_REFRESH_INTERVAL_MS,
                config.refresh.interval_ms()
            ),
        });
    }

    if config.refresh.max_age_ms == Some(0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "max_age_ms must be > 0".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StatdeckConfig::default()).is_ok());
    }

    #[test]
    fn test_interval_below_minimum_fails() {
        let mut config = StatdeckConfig::default();
        config.refresh.interval_ms = Some(5_000);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn test_interval_at_minimum_ok() {
        let mut config = StatdeckConfig::default();
        config.refresh.interval_ms = Some(10_000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_max_age_fails() {
        let mut config = StatdeckConfig::default();
        config.refresh.max_age_ms = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_age_ms"));
    }

    #[test]
    fn test_non_http_base_url_fails() {
        let mut config = StatdeckConfig::default();
        config.backend.base_url = Some("ftp://stats".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_zero_request_timeout_fails() {
        let mut config = StatdeckConfig::default();
        config.backend.request_timeout_ms = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
