use clap::ArgMatches;
use tracing::{error, info};

use statdeck_core::MutationKind;

mod console;
mod helpers;
mod mutation;
mod snapshot;
mod watch;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        event = "cli.app.started",
        version = env!("CARGO_PKG_VERSION"),
        command = matches.subcommand_name().unwrap_or("-"),
    );

    match matches.subcommand() {
        Some(("snapshot", sub_matches)) => snapshot::handle_snapshot_command(sub_matches),
        Some(("watch", sub_matches)) => watch::handle_watch_command(sub_matches),
        Some(("clear-cache", sub_matches)) => {
            mutation::handle_mutation_command(sub_matches, MutationKind::ClearCache)
        }
        Some(("reset-metrics", sub_matches)) => {
            mutation::handle_mutation_command(sub_matches, MutationKind::ResetMetrics)
        }
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
