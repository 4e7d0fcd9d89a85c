use std::time::Duration;

use clap::ArgMatches;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use statdeck_core::{Dashboard, DashboardSnapshot, Event};

use super::console::{self, ConsoleInput};
use super::helpers::{build_dashboard, runtime};
use crate::color;
use crate::table;

pub(crate) fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let interval_ms = matches.get_one::<u64>("interval").copied();

    info!(
        event = "cli.watch_started",
        json_output = json_output,
        interval_ms = ?interval_ms
    );

    let runtime = runtime()?;
    runtime.block_on(run_watch(matches, interval_ms, json_output))?;

    info!(event = "cli.watch_completed");
    Ok(())
}

async fn run_watch(
    matches: &ArgMatches,
    interval_ms: Option<u64>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = build_dashboard(matches)?;

    if let Some(ms) = interval_ms
        && let Err(e) = dashboard.set_refresh_interval(Duration::from_millis(ms))
    {
        eprintln!("{}", color::error(&e.to_string()));
        error!(event = "cli.watch.interval_rejected", interval_ms = ms, error = %e);
        return Err(e.into());
    }
    dashboard.set_auto_refresh(true);
    // Detached: the snapshot feed reports progress.
    let _ = dashboard.request_manual_refresh();

    if !json_output {
        eprintln!("{}", color::warning(console::HELP));
    }

    let mut updates = dashboard.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    print_update(&updates.borrow_and_update(), json_output)?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_update(&snapshot, json_output)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!(event = "cli.watch.stdin_closed");
                    break;
                };
                match console::parse_console_line(&line) {
                    Ok(ConsoleInput::Quit) => break,
                    Ok(ConsoleInput::Empty) => {}
                    Ok(ConsoleInput::Help) => eprintln!("{}", console::HELP),
                    Ok(ConsoleInput::Dispatch(command)) => {
                        run_console_command(&dashboard, command, json_output).await?;
                    }
                    Err(message) => eprintln!("{}", color::error(&message)),
                }
            }
            _ = &mut ctrl_c => {
                info!(event = "cli.watch.signal_received", signal = "SIGINT");
                break;
            }
        }
    }

    dashboard.set_auto_refresh(false);
    Ok(())
}

async fn run_console_command(
    dashboard: &Dashboard,
    command: statdeck_core::Command,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match dashboard.dispatch(command).await {
        Ok(events) => {
            for event in &events {
                if json_output {
                    println!("{}", serde_json::to_string(event)?);
                } else {
                    println!("{}", color::muted(&describe_event(event)));
                }
            }
        }
        // A rejected console command leaves the watch running.
        Err(e) => {
            eprintln!("{}", color::error(&e.to_string()));
            warn!(event = "cli.watch.command_failed", error = %e);
        }
    }
    Ok(())
}

fn describe_event(event: &Event) -> String {
    match event {
        Event::RefreshStarted { resources } if resources.is_empty() => {
            "Nothing to refresh; every resource is already loading.".to_string()
        }
        Event::RefreshStarted { resources } => {
            let names: Vec<&str> = resources.iter().map(|name| name.as_str()).collect();
            format!("Refreshing {}", names.join(", "))
        }
        Event::AutoRefreshChanged { enabled: true } => "Auto-refresh on.".to_string(),
        Event::AutoRefreshChanged { enabled: false } => "Auto-refresh off.".to_string(),
        Event::RefreshIntervalChanged { interval_ms } => {
            format!("Refresh interval set to {}ms.", interval_ms)
        }
        Event::ResourcesInvalidated { kind, resources } => {
            let names: Vec<&str> = resources.iter().map(|name| name.as_str()).collect();
            format!("{} done. Refreshing {}", kind, names.join(", "))
        }
        Event::RefreshCancelled { resource } => format!("Cancelled {} refresh.", resource),
    }
}

fn print_update(
    snapshot: &DashboardSnapshot,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}", status_line(snapshot));
    }
    Ok(())
}

/// One line per update: time, then `resource:status` for each resource.
fn status_line(snapshot: &DashboardSnapshot) -> String {
    let cells: Vec<String> = table::rows(snapshot)
        .into_iter()
        .map(|row| format!("{}:{}", color::accent(&row.resource), color::status(&row.status)))
        .collect();
    format!(
        "[{}] {}",
        snapshot
            .generated_at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S"),
        cells.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use statdeck_core::{MutationKind, ResourceName};

    use super::*;

    #[test]
    fn test_describe_refresh_started() {
        let event = Event::RefreshStarted {
            resources: vec![ResourceName::Analytics, ResourceName::UserActivity],
        };
        assert_eq!(describe_event(&event), "Refreshing analytics, userActivity");

        let empty = Event::RefreshStarted { resources: vec![] };
        assert!(describe_event(&empty).starts_with("Nothing to refresh"));
    }

    #[test]
    fn test_describe_invalidation() {
        let event = Event::ResourcesInvalidated {
            kind: MutationKind::ResetMetrics,
            resources: BTreeSet::from([ResourceName::AdvancedStats]),
        };
        assert_eq!(
            describe_event(&event),
            "resetMetrics done. Refreshing advancedStats"
        );
    }
}
