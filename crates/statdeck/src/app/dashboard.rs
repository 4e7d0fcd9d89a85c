use clap::{Arg, ArgAction, Command};

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

pub fn snapshot_command() -> Command {
    Command::new("snapshot")
        .about("Refresh every resource once and print the dashboard")
        .arg(json_arg())
        .arg(
            Arg::new("save")
                .long("save")
                .help("Also append the snapshot to ~/.statdeck/snapshots/")
                .action(ArgAction::SetTrue),
        )
}

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Keep the dashboard refreshed and accept console commands on stdin")
        .long_about(
            "Enables auto-refresh and prints a line whenever the dashboard changes.\n\n\
             Console commands (one per line): refresh, force, auto on|off, \
             interval <ms>, clear-cache, reset-metrics, quit",
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .short('i')
                .help("Auto-refresh interval in milliseconds (minimum 10000)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(json_arg())
}

pub fn clear_cache_command() -> Command {
    Command::new("clear-cache")
        .about("Clear the service cache, then refresh the overview and embedding details")
        .arg(json_arg())
}

pub fn reset_metrics_command() -> Command {
    Command::new("reset-metrics")
        .about("Reset cache metrics, then refresh the advanced cache stats")
        .arg(json_arg())
}
