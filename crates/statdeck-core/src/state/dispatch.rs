use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::errors::{DashboardError, StatdeckError};
use crate::state::events::Event;
use crate::state::store::Store;
use crate::state::types::Command;

impl Dashboard {
    /// Execute one command and describe what it changed.
    pub async fn dispatch(&self, cmd: Command) -> Result<Vec<Event>, DashboardError> {
        debug!(event = "core.state.dispatch_started", command = ?cmd);

        let result = match cmd {
            Command::ManualRefresh => {
                let batch = self.request_manual_refresh();
                Ok(vec![Event::RefreshStarted {
                    resources: batch.resources().to_vec(),
                }])
            }
            Command::ForcedRefresh => {
                let batch = self.request_forced_refresh();
                Ok(vec![Event::RefreshStarted {
                    resources: batch.resources().to_vec(),
                }])
            }
            Command::SetAutoRefresh { enabled } => {
                self.set_auto_refresh(enabled);
                Ok(vec![Event::AutoRefreshChanged { enabled }])
            }
            Command::SetRefreshInterval { interval_ms } => self
                .set_refresh_interval(Duration::from_millis(interval_ms))
                .map(|()| vec![Event::RefreshIntervalChanged { interval_ms }]),
            Command::NotifyMutation { kind } => {
                let invalidation = self.notify_mutation(kind);
                Ok(vec![Event::ResourcesInvalidated {
                    kind,
                    resources: invalidation.resources,
                }])
            }
            Command::PerformMutation { kind } => {
                self.perform_mutation(kind)
                    .await
                    .map(|invalidation| {
                        vec![Event::ResourcesInvalidated {
                            kind,
                            resources: invalidation.resources,
                        }]
                    })
            }
            Command::Cancel { resource } => {
                if self.cancel(resource) {
                    Ok(vec![Event::RefreshCancelled { resource }])
                } else {
                    Ok(vec![])
                }
            }
        };

        match &result {
            Ok(events) => info!(
                event = "core.state.dispatch_completed",
                event_count = events.len()
            ),
            Err(e) if e.is_user_error() => {
                warn!(event = "core.state.dispatch_rejected", error = %e)
            }
            Err(e) => warn!(event = "core.state.dispatch_failed", error = %e),
        }

        result
    }
}

impl Store for Dashboard {
    type Error = DashboardError;

    fn dispatch(&self, cmd: Command) -> BoxFuture<'_, Result<Vec<Event>, DashboardError>> {
        Box::pin(Dashboard::dispatch(self, cmd))
    }
}
