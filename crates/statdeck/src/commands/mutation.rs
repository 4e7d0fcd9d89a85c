use std::collections::BTreeSet;

use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info};

use statdeck_core::{DashboardSnapshot, Invalidation, MutationKind, ResourceName};

use super::helpers::{build_dashboard, print_snapshot_table, runtime};
use crate::color;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse<'a> {
    action: MutationKind,
    invalidated: &'a BTreeSet<ResourceName>,
    snapshot: &'a DashboardSnapshot,
}

fn done_message(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::ClearCache => "Cache cleared.",
        MutationKind::ResetMetrics => "Cache metrics reset.",
    }
}

pub(crate) fn handle_mutation_command(
    matches: &ArgMatches,
    kind: MutationKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");

    info!(
        event = "cli.mutation_started",
        action = %kind,
        json_output = json_output
    );

    let runtime = runtime()?;
    let (invalidated, snapshot) = runtime.block_on(async {
        let dashboard = build_dashboard(matches)?;
        match dashboard.perform_mutation(kind).await {
            Ok(Invalidation {
                resources, batch, ..
            }) => {
                batch.settled().await;
                Ok((resources, dashboard.snapshot()))
            }
            Err(e) => {
                eprintln!("{}", color::error(&e.to_string()));
                error!(
                    event = "cli.mutation_failed",
                    action = %kind,
                    error = %e
                );
                Err::<_, Box<dyn std::error::Error>>(e.into())
            }
        }
    })?;

    if json_output {
        let response = MutationResponse {
            action: kind,
            invalidated: &invalidated,
            snapshot: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let names: Vec<&str> = invalidated.iter().map(|name| name.as_str()).collect();
        println!("{} Refreshed: {}", done_message(kind), names.join(", "));
        print_snapshot_table(&snapshot);
    }

    info!(
        event = "cli.mutation_completed",
        action = %kind,
        invalidated = invalidated.len()
    );

    Ok(())
}
