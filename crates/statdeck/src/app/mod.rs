mod dashboard;
mod global;

#[cfg(test)]
mod tests;

use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(dashboard::snapshot_command())
        .subcommand(dashboard::watch_command())
        .subcommand(dashboard::clear_cache_command())
        .subcommand(dashboard::reset_metrics_command())
}
