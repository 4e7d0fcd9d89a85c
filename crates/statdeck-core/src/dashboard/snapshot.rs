use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::dashboard::store::DashboardState;
use crate::refresh::scheduler::AutoRefreshConfig;
use crate::resources::types::ResourceName;

/// What a subscriber sees: every resource plus the refresh settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(flatten)]
    pub state: DashboardState,
    pub auto_refresh: AutoRefreshConfig,
    pub is_any_stale: bool,
    pub stale: Vec<ResourceName>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub(crate) fn build(
        state: DashboardState,
        auto_refresh: AutoRefreshConfig,
        max_age: Duration,
        now: Instant,
    ) -> Self {
        let stale = state.stale_resources(max_age, now);
        Self {
            is_any_stale: !stale.is_empty(),
            stale,
            state,
            auto_refresh,
            generated_at: Utc::now(),
        }
    }

    pub fn is_loading(&self) -> bool {
        ResourceName::TRACKED
            .into_iter()
            .any(|name| self.state.is_loading(name))
    }

    /// Resources whose last fetch failed, with the recorded message.
    pub fn errors(&self) -> Vec<(ResourceName, String)> {
        let state = &self.state;
        let entries = [
            (
                ResourceName::ComprehensiveStats,
                state.overview().error().map(ToString::to_string),
            ),
            (
                ResourceName::EmbeddingDetails,
                state.embedding_details().error().map(ToString::to_string),
            ),
            (
                ResourceName::AdvancedStats,
                state.advanced_stats().error().map(ToString::to_string),
            ),
            (
                ResourceName::Analytics,
                state.analytics().error().map(ToString::to_string),
            ),
            (
                ResourceName::UserActivity,
                state.user_activity().error().map(ToString::to_string),
            ),
        ];
        entries
            .into_iter()
            .filter_map(|(name, error)| error.map(|e| (name, e)))
            .collect()
    }
}
