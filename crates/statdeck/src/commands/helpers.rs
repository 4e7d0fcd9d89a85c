use std::sync::Arc;

use clap::ArgMatches;
use tracing::{error, warn};

use statdeck_config::StatdeckConfig;
use statdeck_core::backend::HttpBackend;
use statdeck_core::{Dashboard, DashboardOptions, DashboardSnapshot};

use crate::color;
use crate::table::{self, TableFormatter};

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
pub fn load_config_with_warning() -> StatdeckConfig {
    match StatdeckConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{}",
                color::warning(&format!(
                    "Warning: Could not load config: {}. Using defaults.\n\
                     Tip: Check ~/.statdeck/config.toml and ./.statdeck/config.toml for syntax errors.",
                    e
                ))
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            StatdeckConfig::default()
        }
    }
}

/// Apply the global `--base-url` flag on top of the loaded config.
pub fn apply_overrides(mut config: StatdeckConfig, matches: &ArgMatches) -> StatdeckConfig {
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.backend.base_url = Some(base_url.clone());
    }
    config
}

/// Build a dashboard against the configured backend.
///
/// `--token` wins over the configured token environment variable. Must be
/// called inside a tokio runtime.
pub fn build_dashboard(matches: &ArgMatches) -> Result<Dashboard, Box<dyn std::error::Error>> {
    let config = apply_overrides(load_config_with_warning(), matches);

    if let Err(e) = config.validate() {
        eprintln!("{}", color::error(&e.to_string()));
        error!(event = "cli.config.invalid", error = %e);
        return Err(e.into());
    }

    let token = matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| config.backend.access_token());

    let backend = HttpBackend::new(
        config.backend.base_url(),
        token,
        config.backend.request_timeout(),
    )
    .map_err(|e| {
        eprintln!("{}", color::error(&format!("Could not create HTTP client: {}", e)));
        error!(event = "cli.backend.create_failed", error = %e);
        e
    })?;

    let dashboard = Dashboard::new(Arc::new(backend), DashboardOptions::from_config(&config))?;
    Ok(dashboard)
}

/// Single-threaded runtime for one CLI invocation.
pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime)
}

pub fn print_snapshot_table(snapshot: &DashboardSnapshot) {
    let rows = table::rows(snapshot);
    let formatter = TableFormatter::new(&rows);
    formatter.print_table(&rows);

    let auto = &snapshot.auto_refresh;
    let auto_label = if auto.enabled { "on" } else { "off" };
    println!(
        "{}",
        color::muted(&format!(
            "Auto-refresh {} every {}s. Generated {}.",
            auto_label,
            auto.interval_ms / 1000,
            snapshot
                .generated_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        ))
    );
}
