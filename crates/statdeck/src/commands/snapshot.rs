use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use tracing::{error, info, warn};

use statdeck_core::DashboardSnapshot;
use statdeck_paths::StatdeckPaths;

use super::helpers::{build_dashboard, print_snapshot_table, runtime};
use crate::color;

pub(crate) fn handle_snapshot_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let save = matches.get_flag("save");

    info!(
        event = "cli.snapshot_started",
        json_output = json_output,
        save = save
    );

    let runtime = runtime()?;
    let snapshot = runtime.block_on(async {
        let dashboard = build_dashboard(matches)?;
        dashboard.request_forced_refresh().settled().await;
        Ok::<_, Box<dyn std::error::Error>>(dashboard.snapshot())
    })?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot_table(&snapshot);
    }

    if save {
        match StatdeckPaths::resolve() {
            Ok(paths) => match save_snapshot_to(&paths.snapshots_dir(), &snapshot) {
                Ok(path) => {
                    if !json_output {
                        println!("Saved to {}", path.display());
                    }
                }
                Err(e) => {
                    eprintln!("{}", color::error(&format!("Failed to save snapshot: {}", e)));
                    error!(event = "cli.snapshot.save_failed", error = %e);
                    return Err(e.into());
                }
            },
            Err(e) => {
                eprintln!("{}", color::error(&format!("Failed to save snapshot: {}", e)));
                error!(event = "cli.snapshot.save_failed", error = %e);
                return Err(e.into());
            }
        }
    }

    let failed = snapshot.errors();
    for (resource, message) in &failed {
        warn!(
            event = "cli.snapshot.resource_failed",
            resource = %resource,
            error = message.as_str()
        );
    }

    info!(
        event = "cli.snapshot_completed",
        failed = failed.len(),
        stale = snapshot.stale.len()
    );

    // Per-resource failures are part of the dashboard, not a command failure.
    Ok(())
}

/// Append one snapshot as a JSON line to the day's file in `dir`.
///
/// Returns the file written to.
pub(crate) fn save_snapshot_to(
    dir: &Path,
    snapshot: &DashboardSnapshot,
) -> Result<PathBuf, std::io::Error> {
    fs::create_dir_all(dir)?;

    let filename = format!("{}.jsonl", snapshot.generated_at.format("%Y-%m-%d"));
    let path = dir.join(filename);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", serde_json::to_string(snapshot)?)?;

    info!(event = "cli.snapshot.saved", path = %path.display());
    Ok(path)
}
