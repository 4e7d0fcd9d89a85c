use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::errors::DashboardError;

/// One named unit of dashboard data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceName {
    ComprehensiveStats,
    /// Degraded half of the overview pair. Only fetched as a fallback.
    BasicStats,
    EmbeddingDetails,
    AdvancedStats,
    Analytics,
    UserActivity,
}

impl ResourceName {
    /// Resources covered by the scheduler and by whole-dashboard refreshes.
    ///
    /// `ComprehensiveStats` stands for the whole overview fallback pair.
    pub const TRACKED: [ResourceName; 5] = [
        ResourceName::ComprehensiveStats,
        ResourceName::EmbeddingDetails,
        ResourceName::AdvancedStats,
        ResourceName::Analytics,
        ResourceName::UserActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceName::ComprehensiveStats => "comprehensiveStats",
            ResourceName::BasicStats => "basicStats",
            ResourceName::EmbeddingDetails => "embeddingDetails",
            ResourceName::AdvancedStats => "advancedStats",
            ResourceName::Analytics => "analytics",
            ResourceName::UserActivity => "userActivity",
        }
    }

    /// The tracked resource whose refresh covers this one.
    pub fn tracked(self) -> ResourceName {
        match self {
            ResourceName::BasicStats => ResourceName::ComprehensiveStats,
            other => other,
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceName {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "comprehensivestats" | "overview" => Ok(ResourceName::ComprehensiveStats),
            "basicstats" => Ok(ResourceName::BasicStats),
            "embeddingdetails" | "embeddings" => Ok(ResourceName::EmbeddingDetails),
            "advancedstats" | "cache" => Ok(ResourceName::AdvancedStats),
            "analytics" => Ok(ResourceName::Analytics),
            "useractivity" | "users" => Ok(ResourceName::UserActivity),
            _ => Err(DashboardError::UnknownResource {
                name: s.to_string(),
            }),
        }
    }
}

/// Fetch lifecycle of a single resource.
///
/// Created empty at controller init and mutated only by the resource's own
/// fetcher. `fetched_instant` is the monotonic twin of `last_fetched_at`
/// and drives staleness checks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState<T> {
    data: Option<T>,
    loading: bool,
    error: Option<DashboardError>,
    last_fetched_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    fetched_instant: Option<Instant>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_fetched_at: None,
            fetched_instant: None,
        }
    }
}

impl<T> ResourceState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&DashboardError> {
        self.error.as_ref()
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    pub fn fetched_instant(&self) -> Option<Instant> {
        self.fetched_instant
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Record a successful fetch. Clears any previous error.
    pub(crate) fn commit_success(&mut self, data: T, at: DateTime<Utc>, instant: Instant) {
        self.data = Some(data);
        self.error = None;
        self.loading = false;
        self.last_fetched_at = Some(at);
        self.fetched_instant = Some(instant);
    }

    /// Record a failed fetch. Previous data and freshness are kept.
    pub(crate) fn commit_failure(&mut self, error: DashboardError) {
        self.error = Some(error);
        self.loading = false;
    }
}
