use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use statdeck_config::StatdeckConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{
    AdvancedCacheStats, AnalyticsSummary, BackendError, BackendResult, BasicStats,
    ComprehensiveStats, EmbeddingDetails, HttpBackend, StatsBackend, UserActivity,
};
use crate::dashboard::snapshot::DashboardSnapshot;
use crate::dashboard::store::{DashboardState, DashboardStore};
use crate::errors::{DashboardError, StatdeckError, StatdeckResult};
use crate::invalidation::MutationKind;
use crate::refresh::coordinator::{RefreshCoordinator, RefreshRegistration, RefreshTicket};
use crate::refresh::freshness::is_stale;
use crate::refresh::scheduler::{
    AutoRefreshConfig, AutoRefreshHandle, RefreshScheduler, SchedulerState,
};
use crate::resources::fallback::{FallbackPair, FallbackResolver};
use crate::resources::fetcher::{RemoteCall, ResourceFetcher, transport_error};
use crate::resources::types::{ResourceName, ResourceState};

/// Construction parameters for a [`Dashboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub auto_refresh: bool,
    pub interval: Duration,
    /// Staleness threshold used by the scheduler tick. `None` derives it
    /// from the current refresh interval.
    pub max_age: Option<Duration>,
    /// Outer bound on every remote call.
    pub request_timeout: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::from_config(&StatdeckConfig::default())
    }
}

impl DashboardOptions {
    pub fn from_config(config: &StatdeckConfig) -> Self {
        Self {
            auto_refresh: config.refresh.auto_refresh(),
            interval: config.refresh.interval(),
            max_age: config.refresh.max_age(),
            request_timeout: config.backend.request_timeout(),
        }
    }
}

/// Whether a refresh may supersede one already running for the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Leave a running refresh alone.
    IfIdle,
    /// Cancel a running refresh and start over.
    Force,
}

/// Refreshes started by one call.
///
/// The work runs on spawned tasks whether or not the batch is awaited.
#[derive(Debug, Default)]
pub struct RefreshBatch {
    resources: Vec<ResourceName>,
    handles: Vec<JoinHandle<()>>,
}

impl RefreshBatch {
    fn push(&mut self, name: ResourceName, handle: JoinHandle<()>) {
        self.resources.push(name);
        self.handles.push(handle);
    }

    /// Resources a refresh was actually started for.
    pub fn resources(&self) -> &[ResourceName] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Wait until every refresh in the batch has settled or been discarded.
    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(e) = handle.await
                && e.is_panic()
            {
                warn!(event = "core.refresh.task_panicked", error = %e);
            }
        }
    }
}

/// Outcome of a selective invalidation.
#[derive(Debug)]
pub struct Invalidation {
    pub kind: MutationKind,
    /// Every resource the mutation affects.
    pub resources: BTreeSet<ResourceName>,
    pub batch: RefreshBatch,
}

struct DashboardInner {
    store: Arc<DashboardStore>,
    coordinator: RefreshCoordinator,
    backend: Arc<dyn StatsBackend>,
    overview: FallbackResolver<ComprehensiveStats, BasicStats>,
    embedding_details: ResourceFetcher<EmbeddingDetails>,
    advanced_stats: ResourceFetcher<AdvancedCacheStats>,
    analytics: ResourceFetcher<AnalyticsSummary>,
    user_activity: ResourceFetcher<UserActivity>,
    request_timeout: Duration,
}

fn remote<T, F>(backend: &Arc<dyn StatsBackend>, call: F) -> RemoteCall<T>
where
    F: Fn(Arc<dyn StatsBackend>) -> BoxFuture<'static, BackendResult<T>> + Send + Sync + 'static,
{
    let backend = Arc::clone(backend);
    Arc::new(move || call(Arc::clone(&backend)))
}

fn overview_slot(
    state: &mut DashboardState,
) -> &mut FallbackPair<ComprehensiveStats, BasicStats> {
    &mut state.overview
}

fn overview_rich_slot(state: &mut DashboardState) -> &mut ResourceState<ComprehensiveStats> {
    &mut state.overview.rich
}

fn overview_degraded_slot(state: &mut DashboardState) -> &mut ResourceState<BasicStats> {
    &mut state.overview.degraded
}

fn embedding_details_slot(
    state: &mut DashboardState,
) -> &mut ResourceState<EmbeddingDetails> {
    &mut state.embedding_details
}

fn advanced_stats_slot(
    state: &mut DashboardState,
) -> &mut ResourceState<AdvancedCacheStats> {
    &mut state.advanced_stats
}

fn analytics_slot(state: &mut DashboardState) -> &mut ResourceState<AnalyticsSummary> {
    &mut state.analytics
}

fn user_activity_slot(state: &mut DashboardState) -> &mut ResourceState<UserActivity> {
    &mut state.user_activity
}

impl DashboardInner {
    fn new(
        backend: Arc<dyn StatsBackend>,
        store: Arc<DashboardStore>,
        request_timeout: Duration,
    ) -> Self {
        let overview = FallbackResolver::new(
            ResourceFetcher::new(
                ResourceName::ComprehensiveStats,
                remote(&backend, |b| {
                    Box::pin(async move { b.comprehensive_stats().await })
                }),
                transport_error,
                overview_rich_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            ResourceFetcher::new(
                ResourceName::BasicStats,
                remote(&backend, |b| Box::pin(async move { b.basic_stats().await })),
                transport_error,
                overview_degraded_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            overview_slot,
        );

        Self {
            overview,
            embedding_details: ResourceFetcher::new(
                ResourceName::EmbeddingDetails,
                remote(&backend, |b| {
                    Box::pin(async move { b.embedding_details().await })
                }),
                transport_error,
                embedding_details_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            advanced_stats: ResourceFetcher::new(
                ResourceName::AdvancedStats,
                remote(&backend, |b| Box::pin(async move { b.advanced_stats().await })),
                transport_error,
                advanced_stats_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            analytics: ResourceFetcher::new(
                ResourceName::Analytics,
                remote(&backend, |b| Box::pin(async move { b.analytics().await })),
                transport_error,
                analytics_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            user_activity: ResourceFetcher::new(
                ResourceName::UserActivity,
                remote(&backend, |b| Box::pin(async move { b.user_activity().await })),
                transport_error,
                user_activity_slot,
                request_timeout,
                Arc::clone(&store),
            ),
            coordinator: RefreshCoordinator::new(),
            backend,
            store,
            request_timeout,
        }
    }

    async fn run(
        &self,
        name: ResourceName,
        token: &CancellationToken,
    ) -> Result<(), DashboardError> {
        match name.tracked() {
            ResourceName::ComprehensiveStats | ResourceName::BasicStats => {
                self.overview.resolve(token).await.into_result()
            }
            ResourceName::EmbeddingDetails => {
                self.embedding_details.fetch(token).await.into_result()
            }
            ResourceName::AdvancedStats => self.advanced_stats.fetch(token).await.into_result(),
            ResourceName::Analytics => self.analytics.fetch(token).await.into_result(),
            ResourceName::UserActivity => self.user_activity.fetch(token).await.into_result(),
        }
    }

    fn start_refresh(
        self: &Arc<Self>,
        name: ResourceName,
        mode: RefreshMode,
    ) -> Option<JoinHandle<()>> {
        let name = name.tracked();
        let ticket = match mode {
            RefreshMode::IfIdle => self.coordinator.begin_if_idle(name.as_str())?,
            RefreshMode::Force => self.coordinator.begin(name.as_str()),
        };
        self.launch(name, ticket)
    }

    /// Flag `name` as loading and spawn the fetch for `ticket`. Nothing
    /// happens if the ticket was cancelled or superseded since `begin`.
    fn launch(
        self: &Arc<Self>,
        name: ResourceName,
        ticket: RefreshTicket,
    ) -> Option<JoinHandle<()>> {
        if !self
            .store
            .commit_if_current(ticket.token(), |state| state.set_loading(name, true))
        {
            debug!(event = "core.refresh.launch_skipped", resource = %name);
            return None;
        }

        let inner = Arc::clone(self);
        Some(tokio::spawn(async move {
            let result = inner.run(name, ticket.token()).await;
            inner
                .coordinator
                .finish(&ticket, result.map_err(|e| e.to_string()));
        }))
    }

    fn start_batch(
        self: &Arc<Self>,
        names: impl IntoIterator<Item = ResourceName>,
        mode: RefreshMode,
    ) -> RefreshBatch {
        let mut batch = RefreshBatch::default();
        for name in names {
            if let Some(handle) = self.start_refresh(name, mode) {
                batch.push(name.tracked(), handle);
            }
        }
        batch
    }

    /// Scheduler tick: refresh exactly the stale resources, without
    /// suspending between the staleness check and starting the refreshes.
    fn on_tick(self: &Arc<Self>) {
        let max_age = self.store.max_age();
        let now = Instant::now();
        let stale = self
            .store
            .read(|state| state.stale_resources(max_age, now));

        if stale.is_empty() {
            debug!(event = "core.scheduler.tick_skipped", reason = "all_fresh");
            return;
        }

        info!(
            event = "core.scheduler.tick_refresh",
            resources = ?stale,
        );
        // Handles are dropped; tick refreshes report through the snapshot feed.
        let _ = self.start_batch(stale, RefreshMode::IfIdle);
    }
}

/// The refresh controller for one dashboard.
///
/// All methods that start work spawn onto the current tokio runtime and must
/// be called from within one. Dropping the dashboard stops the scheduler and
/// discards every in-flight refresh.
pub struct Dashboard {
    inner: Arc<DashboardInner>,
    scheduler: RefreshScheduler,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn StatsBackend>,
        options: DashboardOptions,
    ) -> Result<Self, DashboardError> {
        let handle = AutoRefreshHandle::new(AutoRefreshConfig::new(false, options.interval)?);
        let store = Arc::new(DashboardStore::new(handle.clone(), options.max_age));
        let inner = Arc::new(DashboardInner::new(
            backend,
            store,
            options.request_timeout,
        ));

        let weak: Weak<DashboardInner> = Arc::downgrade(&inner);
        let scheduler = RefreshScheduler::new(
            handle,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_tick();
                }
            }),
        );

        info!(
            event = "core.dashboard.created",
            auto_refresh = options.auto_refresh,
            interval_ms = options.interval.as_millis() as u64,
            max_age_ms = ?options.max_age.map(|d| d.as_millis() as u64),
        );

        let dashboard = Self { inner, scheduler };
        if options.auto_refresh {
            dashboard.set_auto_refresh(true);
        }
        Ok(dashboard)
    }

    /// Build a dashboard talking HTTP to the configured backend.
    pub fn from_config(config: &StatdeckConfig) -> StatdeckResult<Self> {
        let backend = HttpBackend::from_config(&config.backend)
            .map_err(|e| Box::new(e) as Box<dyn StatdeckError>)?;
        Self::new(Arc::new(backend), DashboardOptions::from_config(config))
            .map_err(|e| Box::new(e) as Box<dyn StatdeckError>)
    }

    /// Refresh every tracked resource, bypassing staleness. Resources that
    /// are already being fetched are left to finish and are not in the batch.
    pub fn request_manual_refresh(&self) -> RefreshBatch {
        let batch = self
            .inner
            .start_batch(ResourceName::TRACKED, RefreshMode::IfIdle);
        info!(
            event = "core.dashboard.manual_refresh",
            resources = ?batch.resources(),
        );
        batch
    }

    /// Refresh every tracked resource, superseding in-flight refreshes.
    pub fn request_forced_refresh(&self) -> RefreshBatch {
        let batch = self
            .inner
            .start_batch(ResourceName::TRACKED, RefreshMode::Force);
        info!(event = "core.dashboard.forced_refresh");
        batch
    }

    /// Refresh a single resource.
    pub fn refresh(&self, name: ResourceName, mode: RefreshMode) -> RefreshBatch {
        self.inner.start_batch([name], mode)
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        if enabled {
            self.scheduler.enable();
        } else {
            self.scheduler.disable();
        }
        self.inner.store.publish();
    }

    pub fn set_refresh_interval(&self, interval: Duration) -> Result<(), DashboardError> {
        self.scheduler.set_interval(interval)?;
        self.inner.store.publish();
        Ok(())
    }

    /// A mutation happened; refresh only the resources it affects.
    ///
    /// Affected refreshes supersede anything in flight, since data fetched
    /// before the mutation is already outdated.
    pub fn notify_mutation(&self, kind: MutationKind) -> Invalidation {
        let resources = kind.affected_set();
        info!(
            event = "core.invalidation.started",
            mutation = %kind,
            resources = ?resources,
        );
        let batch = self
            .inner
            .start_batch(resources.iter().copied(), RefreshMode::Force);
        Invalidation {
            kind,
            resources,
            batch,
        }
    }

    /// Run the mutation against the backend, then invalidate what it affects.
    /// Nothing is refreshed when the mutation fails.
    pub async fn perform_mutation(
        &self,
        kind: MutationKind,
    ) -> Result<Invalidation, DashboardError> {
        info!(event = "core.mutation.started", mutation = %kind);

        let backend = Arc::clone(&self.inner.backend);
        let call = match kind {
            MutationKind::ClearCache => backend.clear_cache(),
            MutationKind::ResetMetrics => backend.reset_metrics(),
        };
        let timeout = self.inner.request_timeout;
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = result {
            warn!(event = "core.mutation.failed", mutation = %kind, error = %e);
            return Err(DashboardError::MutationFailed {
                action: kind.as_str().to_string(),
                message: e.to_string(),
            });
        }

        info!(event = "core.mutation.completed", mutation = %kind);
        Ok(self.notify_mutation(kind))
    }

    /// Cancel a resource's in-flight refresh without starting another.
    pub fn cancel(&self, name: ResourceName) -> bool {
        let name = name.tracked();
        if !self.inner.coordinator.cancel(name.as_str()) {
            return false;
        }
        self.inner
            .store
            .update(|state| state.set_loading(name, false));
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.inner.store.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.inner.store.snapshot()
    }

    pub fn is_stale(&self, name: ResourceName, max_age: Duration) -> bool {
        let last = self.inner.store.read(|state| state.fetched_instant(name));
        is_stale(last, max_age, Instant::now())
    }

    pub fn registration(&self, name: ResourceName) -> Option<RefreshRegistration> {
        self.inner.coordinator.registration(name.tracked().as_str())
    }

    pub fn auto_refresh(&self) -> AutoRefreshConfig {
        self.scheduler.config()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Staleness threshold in effect for the next tick.
    pub fn max_age(&self) -> Duration {
        self.inner.store.max_age()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.scheduler.disable();
        self.inner.coordinator.cancel_all();
        debug!(event = "core.dashboard.dropped");
    }
}
