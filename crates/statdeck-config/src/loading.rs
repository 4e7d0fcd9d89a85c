//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.statdeck/config.toml` (global user preferences)
//! 3. **Project config** - `./.statdeck/config.toml` (project-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority, applied by the caller)

use std::fs;
use std::path::Path;

use statdeck_paths::StatdeckPaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::{BackendConfig, RefreshConfig, StatdeckConfig};
use crate::validation::validate_config;

fn is_file_not_found(e: &ConfigError) -> bool {
    matches!(e, ConfigError::IoError { source } if source.kind() == std::io::ErrorKind::NotFound)
}

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file cannot be parsed or validation fails.
/// Missing config files are not errors.
pub fn load_hierarchy() -> Result<StatdeckConfig, ConfigError> {
    let mut config = StatdeckConfig::default();

    match load_user_config() {
        Ok(user_config) => config = merge_configs(config, user_config),
        Err(e) if !is_file_not_found(&e) => return Err(e),
        Err(_) => debug!(event = "config.user_config_missing"),
    }

    match load_project_config() {
        Ok(project_config) => config = merge_configs(config, project_config),
        Err(e) if !is_file_not_found(&e) => return Err(e),
        Err(_) => debug!(event = "config.project_config_missing"),
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load the user configuration from ~/.statdeck/config.toml.
fn load_user_config() -> Result<StatdeckConfig, ConfigError> {
    let paths = StatdeckPaths::resolve().map_err(|e| ConfigError::InvalidConfiguration {
        message: e.to_string(),
    })?;
    load_config_file(&paths.user_config())
}

/// Load the project configuration from ./.statdeck/config.toml.
fn load_project_config() -> Result<StatdeckConfig, ConfigError> {
    let project_root = std::env::current_dir()?;
    load_config_file(&StatdeckPaths::project_config(&project_root))
}

/// Load a configuration file from the given path.
fn load_config_file(path: &Path) -> Result<StatdeckConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("'{}': {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        message: format!("'{}': {}", path.display(), e),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Override values replace base values only if present.
pub fn merge_configs(base: StatdeckConfig, override_config: StatdeckConfig) -> StatdeckConfig {
    StatdeckConfig {
        backend: BackendConfig::merge(&base.backend, &override_config.backend),
        refresh: RefreshConfig::merge(&base.refresh, &override_config.refresh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_override_wins() {
        let user: StatdeckConfig = toml::from_str(
            r#"
[backend]
base_url = "http://user-host:8000"
request_timeout_ms = 5000

[refresh]
interval_ms = 20000
"#,
        )
        .unwrap();
        let project: StatdeckConfig = toml::from_str(
            r#"
[backend]
base_url = "http://project-host:8000"
"#,
        )
        .unwrap();

        let merged = merge_configs(user, project);
        assert_eq!(merged.backend.base_url(), "http://project-host:8000");
        // User values preserved where project is silent
        assert_eq!(merged.backend.request_timeout_ms, Some(5000));
        assert_eq!(merged.refresh.interval_ms(), 20_000);
    }

    #[test]
    fn test_merge_empty_override_keeps_base() {
        let base: StatdeckConfig = toml::from_str(
            r#"
[refresh]
auto_refresh = true
max_age_ms = 90000
"#,
        )
        .unwrap();
        let merged = merge_configs(base, StatdeckConfig::default());
        assert!(merged.refresh.auto_refresh());
        assert_eq!(merged.refresh.max_age_ms, Some(90_000));
    }

    #[test]
    fn test_load_config_file_parse_error_returns_err() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "invalid = toml [[[").unwrap();
        let result = load_config_file(&path);
        assert!(matches!(
            result,
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_load_config_file_not_found_is_io_error() {
        let result = load_config_file(Path::new("/nonexistent/path/config.toml"));
        let err = result.unwrap_err();
        assert!(is_file_not_found(&err), "expected NotFound, got: {}", err);
    }

    #[test]
    fn test_load_hierarchy_reads_user_config_from_home() {
        let home = tempfile::tempdir().unwrap();
        let statdeck_dir = home.path().join(".statdeck");
        fs::create_dir_all(&statdeck_dir).unwrap();
        fs::write(
            statdeck_dir.join("config.toml"),
            r#"
[refresh]
auto_refresh = true
interval_ms = 15000
"#,
        )
        .unwrap();

        temp_env::with_var("HOME", Some(home.path()), || {
            let config = load_hierarchy().unwrap();
            assert!(config.refresh.auto_refresh());
            assert_eq!(config.refresh.interval_ms(), 15_000);
        });
    }

    #[test]
    fn test_load_hierarchy_rejects_invalid_user_config() {
        let home = tempfile::tempdir().unwrap();
        let statdeck_dir = home.path().join(".statdeck");
        fs::create_dir_all(&statdeck_dir).unwrap();
        fs::write(
            statdeck_dir.join("config.toml"),
            r#"
[refresh]
interval_ms = 1000
"#,
        )
        .unwrap();

        temp_env::with_var("HOME", Some(home.path()), || {
            let err = load_hierarchy().unwrap_err();
            assert!(err.to_string().contains("interval_ms"));
        });
    }

    #[test]
    fn test_load_hierarchy_without_files_uses_defaults() {
        let home = tempfile::tempdir().unwrap();
        temp_env::with_var("HOME", Some(home.path()), || {
            let config = load_hierarchy().unwrap();
            assert_eq!(config.backend.base_url(), "http://localhost:8000");
            assert!(!config.refresh.auto_refresh());
        });
    }
}
