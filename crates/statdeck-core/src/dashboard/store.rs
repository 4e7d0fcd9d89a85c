use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::{
    AdvancedCacheStats, AnalyticsSummary, BasicStats, ComprehensiveStats, EmbeddingDetails,
    UserActivity,
};
use crate::dashboard::snapshot::DashboardSnapshot;
use crate::refresh::freshness::{interval_max_age, is_stale};
use crate::refresh::scheduler::{AutoRefreshConfig, AutoRefreshHandle};
use crate::resources::fallback::FallbackPair;
use crate::resources::types::{ResourceName, ResourceState};

/// Every resource the dashboard shows.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub(crate) overview: FallbackPair<ComprehensiveStats, BasicStats>,
    pub(crate) embedding_details: ResourceState<EmbeddingDetails>,
    pub(crate) advanced_stats: ResourceState<AdvancedCacheStats>,
    pub(crate) analytics: ResourceState<AnalyticsSummary>,
    pub(crate) user_activity: ResourceState<UserActivity>,
}

impl DashboardState {
    pub fn overview(&self) -> &FallbackPair<ComprehensiveStats, BasicStats> {
        &self.overview
    }

    pub fn embedding_details(&self) -> &ResourceState<EmbeddingDetails> {
        &self.embedding_details
    }

    pub fn advanced_stats(&self) -> &ResourceState<AdvancedCacheStats> {
        &self.advanced_stats
    }

    pub fn analytics(&self) -> &ResourceState<AnalyticsSummary> {
        &self.analytics
    }

    pub fn user_activity(&self) -> &ResourceState<UserActivity> {
        &self.user_activity
    }

    /// Monotonic time of the last successful fetch.
    ///
    /// The overview counts as fetched when either half last succeeded.
    pub fn fetched_instant(&self, name: ResourceName) -> Option<Instant> {
        match name {
            ResourceName::ComprehensiveStats => self.overview.fetched_instant(),
            ResourceName::BasicStats => self.overview.degraded.fetched_instant(),
            ResourceName::EmbeddingDetails => self.embedding_details.fetched_instant(),
            ResourceName::AdvancedStats => self.advanced_stats.fetched_instant(),
            ResourceName::Analytics => self.analytics.fetched_instant(),
            ResourceName::UserActivity => self.user_activity.fetched_instant(),
        }
    }

    pub fn last_fetched_at(&self, name: ResourceName) -> Option<DateTime<Utc>> {
        match name {
            ResourceName::ComprehensiveStats => self.overview.rich.last_fetched_at(),
            ResourceName::BasicStats => self.overview.degraded.last_fetched_at(),
            ResourceName::EmbeddingDetails => self.embedding_details.last_fetched_at(),
            ResourceName::AdvancedStats => self.advanced_stats.last_fetched_at(),
            ResourceName::Analytics => self.analytics.last_fetched_at(),
            ResourceName::UserActivity => self.user_activity.last_fetched_at(),
        }
    }

    pub fn is_loading(&self, name: ResourceName) -> bool {
        match name {
            ResourceName::ComprehensiveStats => self.overview.is_loading(),
            ResourceName::BasicStats => self.overview.degraded.is_loading(),
            ResourceName::EmbeddingDetails => self.embedding_details.is_loading(),
            ResourceName::AdvancedStats => self.advanced_stats.is_loading(),
            ResourceName::Analytics => self.analytics.is_loading(),
            ResourceName::UserActivity => self.user_activity.is_loading(),
        }
    }

    /// Set the loading flag of a tracked resource.
    ///
    /// For the overview the rich half carries the flag. The degraded half
    /// is flagged by its own fetcher when consulted, and any earlier
    /// degraded attempt is dead once a new overview refresh starts or stops.
    pub(crate) fn set_loading(&mut self, name: ResourceName, loading: bool) {
        match name.tracked() {
            ResourceName::ComprehensiveStats => {
                self.overview.rich.set_loading(loading);
                self.overview.degraded.set_loading(false);
            }
            ResourceName::EmbeddingDetails => self.embedding_details.set_loading(loading),
            ResourceName::AdvancedStats => self.advanced_stats.set_loading(loading),
            ResourceName::Analytics => self.analytics.set_loading(loading),
            ResourceName::UserActivity => self.user_activity.set_loading(loading),
            ResourceName::BasicStats => {}
        }
    }

    pub fn stale_resources(&self, max_age: Duration, now: Instant) -> Vec<ResourceName> {
        ResourceName::TRACKED
            .into_iter()
            .filter(|name| is_stale(self.fetched_instant(*name), max_age, now))
            .collect()
    }
}

/// Owner of the dashboard state and its change feed.
///
/// Every write goes through `update` or `commit_if_current` and republishes
/// a snapshot. The state lock is never held across an await.
#[derive(Debug)]
pub struct DashboardStore {
    state: Mutex<DashboardState>,
    auto_refresh: AutoRefreshHandle,
    /// Explicit threshold. `None` follows the current refresh interval.
    max_age: Option<Duration>,
    tx: watch::Sender<DashboardSnapshot>,
}

impl DashboardStore {
    pub fn new(auto_refresh: AutoRefreshHandle, max_age: Option<Duration>) -> Self {
        let state = DashboardState::default();
        let config = auto_refresh.config();
        let initial = DashboardSnapshot::build(
            state.clone(),
            config,
            max_age.unwrap_or_else(|| interval_max_age(config.interval())),
            Instant::now(),
        );
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Mutex::new(state),
            auto_refresh,
            max_age,
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Staleness threshold in effect right now.
    pub fn max_age(&self) -> Duration {
        self.max_age_for(self.auto_refresh.config())
    }

    fn max_age_for(&self, config: AutoRefreshConfig) -> Duration {
        self.max_age
            .unwrap_or_else(|| interval_max_age(config.interval()))
    }

    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.lock())
    }

    pub fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        let mut state = self.lock();
        f(&mut state);
        self.publish_locked(&state);
    }

    /// Apply `f` only if `token` is still live, checked under the state lock.
    pub fn commit_if_current(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut DashboardState),
    ) -> bool {
        let mut state = self.lock();
        if token.is_cancelled() {
            return false;
        }
        f(&mut state);
        self.publish_locked(&state);
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.lock().clone();
        self.build_snapshot(state)
    }

    /// Re-emit the current snapshot to subscribers.
    pub fn publish(&self) {
        let state = self.lock();
        self.publish_locked(&state);
    }

    // Publishing under the state lock keeps snapshots in commit order.
    fn publish_locked(&self, state: &DashboardState) {
        self.tx.send_replace(self.build_snapshot(state.clone()));
    }

    fn build_snapshot(&self, state: DashboardState) -> DashboardSnapshot {
        let config = self.auto_refresh.config();
        DashboardSnapshot::build(state, config, self.max_age_for(config), Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::refresh::scheduler::RefreshScheduler;

    fn store() -> DashboardStore {
        let config = AutoRefreshConfig::new(false, Duration::from_secs(30)).unwrap();
        DashboardStore::new(AutoRefreshHandle::new(config), Some(Duration::from_secs(30)))
    }

    #[test]
    fn test_everything_stale_initially() {
        let store = store();
        let stale = store.read(|s| s.stale_resources(store.max_age(), Instant::now()));
        assert_eq!(stale, ResourceName::TRACKED.to_vec());
    }

    #[test]
    fn test_commit_skipped_once_token_cancelled() {
        let store = store();
        let token = CancellationToken::new();
        token.cancel();

        let committed =
            store.commit_if_current(&token, |s| s.set_loading(ResourceName::Analytics, true));
        assert!(!committed);
        assert!(!store.read(|s| s.is_loading(ResourceName::Analytics)));
    }

    #[test]
    fn test_update_publishes_snapshot() {
        let store = store();
        let rx = store.subscribe();
        store.update(|s| s.set_loading(ResourceName::UserActivity, true));

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow().state.user_activity().is_loading());
    }

    #[test]
    fn test_overview_loading_follows_rich_half() {
        let mut state = DashboardState::default();
        state.set_loading(ResourceName::ComprehensiveStats, true);
        assert!(state.is_loading(ResourceName::ComprehensiveStats));
        assert!(!state.is_loading(ResourceName::BasicStats));

        state.overview.degraded.set_loading(true);
        state.set_loading(ResourceName::ComprehensiveStats, false);
        assert!(!state.is_loading(ResourceName::ComprehensiveStats));
    }

    #[test]
    fn test_unset_max_age_follows_current_interval() {
        let handle = AutoRefreshHandle::new(
            AutoRefreshConfig::new(false, Duration::from_secs(30)).unwrap(),
        );
        let store = DashboardStore::new(handle.clone(), None);
        assert_eq!(store.max_age(), Duration::from_secs(27));

        let scheduler = RefreshScheduler::new(handle, Arc::new(|| {}));
        scheduler.set_interval(Duration::from_secs(10)).unwrap();
        assert_eq!(store.max_age(), Duration::from_secs(9));
    }
}
