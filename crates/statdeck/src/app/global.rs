use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("statdeck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch a search service's stats dashboard from the terminal")
        .long_about("statdeck polls the stats endpoints of a search service, keeps each resource's latest value with its loading and error state, and refreshes stale resources on a timer. Cache-clear and metric-reset actions refresh only the resources they affect.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Stats service base URL (overrides config)")
                .value_name("URL")
                .global(true),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .help("Access token sent as a bearer header (overrides the token env var)")
                .value_name("TOKEN")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
