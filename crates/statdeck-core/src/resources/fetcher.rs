//! Uniform async contract around one remote read.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::BackendError;
use crate::dashboard::store::{DashboardState, DashboardStore};
use crate::errors::DashboardError;
use crate::resources::types::{ResourceName, ResourceState};

/// The remote read a fetcher is bound to.
pub type RemoteCall<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<T, BackendError>> + Send + Sync>;

/// Locates the fetcher's own `ResourceState` inside the dashboard state.
pub type StateSlot<T> = fn(&mut DashboardState) -> &mut ResourceState<T>;

/// Maps a backend failure to what the dashboard records.
pub type ErrorMapping = fn(BackendError) -> DashboardError;

/// Default failure mapping: every backend failure is a transport error.
pub fn transport_error(error: BackendError) -> DashboardError {
    DashboardError::TransportError {
        message: error.to_string(),
    }
}

/// How a fetch settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was written to state.
    Committed(Result<(), DashboardError>),
    /// The refresh was superseded or cancelled; nothing was written.
    Discarded,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Committed(Ok(())))
    }

    /// Collapse into a plain result. A discarded fetch is not a failure.
    pub fn into_result(self) -> Result<(), DashboardError> {
        match self {
            FetchOutcome::Committed(result) => result,
            FetchOutcome::Discarded => Ok(()),
        }
    }
}

/// Wraps one remote read behind the fetch contract.
///
/// `fetch` flips `loading` before calling out, bounds the call with an outer
/// timeout, and commits exactly one of data/error unless the captured
/// cancellation token fired in the meantime. It never panics or returns the
/// backend error directly; callers observe state transitions.
///
/// Concurrent fetches of the same resource are not deduplicated here; that
/// is the refresh coordinator's job.
pub struct ResourceFetcher<T> {
    name: ResourceName,
    remote: RemoteCall<T>,
    map_error: ErrorMapping,
    slot: StateSlot<T>,
    timeout: Duration,
    store: Arc<DashboardStore>,
}

impl<T> Clone for ResourceFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            remote: Arc::clone(&self.remote),
            map_error: self.map_error,
            slot: self.slot,
            timeout: self.timeout,
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> fmt::Debug for ResourceFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ResourceFetcher<T> {
    pub fn new(
        name: ResourceName,
        remote: RemoteCall<T>,
        map_error: ErrorMapping,
        slot: StateSlot<T>,
        timeout: Duration,
        store: Arc<DashboardStore>,
    ) -> Self {
        Self {
            name,
            remote,
            map_error,
            slot,
            timeout,
            store,
        }
    }

    pub fn name(&self) -> ResourceName {
        self.name
    }

    pub async fn fetch(&self, token: &CancellationToken) -> FetchOutcome {
        self.fetch_with(token, |_, _| {}).await
    }

    /// Like [`fetch`](Self::fetch), but `settle` runs inside the same commit
    /// as the result, so subscribers never see one without the other.
    /// It is skipped when the fetch is discarded.
    pub async fn fetch_with<F>(&self, token: &CancellationToken, settle: F) -> FetchOutcome
    where
        F: FnOnce(&mut DashboardState, Result<(), &DashboardError>) + Send,
    {
        let slot = self.slot;
        if !self
            .store
            .commit_if_current(token, |state| slot(state).set_loading(true))
        {
            return FetchOutcome::Discarded;
        }
        debug!(event = "core.fetch.started", resource = %self.name);

        let result = match tokio::time::timeout(self.timeout, (self.remote)()).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(e)) => Err((self.map_error)(e)),
            Err(_) => Err((self.map_error)(BackendError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })),
        };

        let outcome = match result {
            Ok(data) => {
                let committed = self.store.commit_if_current(token, |state| {
                    slot(state).commit_success(data, Utc::now(), Instant::now());
                    settle(state, Ok(()));
                });
                committed.then_some(Ok(()))
            }
            Err(error) => {
                let recorded = error.clone();
                let committed = self.store.commit_if_current(token, |state| {
                    settle(state, Err(&recorded));
                    slot(state).commit_failure(recorded);
                });
                committed.then_some(Err(error))
            }
        };

        match outcome {
            Some(Ok(())) => {
                debug!(event = "core.fetch.completed", resource = %self.name);
                FetchOutcome::Committed(Ok(()))
            }
            Some(Err(error)) => {
                warn!(
                    event = "core.fetch.failed",
                    resource = %self.name,
                    error = %error,
                );
                FetchOutcome::Committed(Err(error))
            }
            None => {
                debug!(event = "core.fetch.discarded", resource = %self.name);
                FetchOutcome::Discarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::backend::AnalyticsSummary;
    use crate::refresh::scheduler::{AutoRefreshConfig, AutoRefreshHandle};

    fn store() -> Arc<DashboardStore> {
        let config = AutoRefreshConfig::new(false, Duration::from_secs(30)).unwrap();
        Arc::new(DashboardStore::new(AutoRefreshHandle::new(config), None))
    }

    fn analytics_slot(state: &mut DashboardState) -> &mut ResourceState<AnalyticsSummary> {
        &mut state.analytics
    }

    fn fetcher(
        store: &Arc<DashboardStore>,
        reply: Result<AnalyticsSummary, BackendError>,
    ) -> ResourceFetcher<AnalyticsSummary> {
        let remote: RemoteCall<AnalyticsSummary> = Arc::new(
            move || -> BoxFuture<'static, Result<AnalyticsSummary, BackendError>> {
                let reply = reply.clone();
                Box::pin(async move { reply })
            },
        );
        ResourceFetcher::new(
            ResourceName::Analytics,
            remote,
            transport_error,
            analytics_slot,
            Duration::from_secs(5),
            Arc::clone(store),
        )
    }

    fn summary(total_requests: u64) -> AnalyticsSummary {
        AnalyticsSummary {
            total_requests,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_settle_runs_in_the_success_commit() {
        let store = store();
        let fetcher = fetcher(&store, Ok(summary(42)));
        let seen = Arc::new(Mutex::new(None));

        let recorder = Arc::clone(&seen);
        let outcome = fetcher
            .fetch_with(&CancellationToken::new(), move |state, result| {
                let slot = analytics_slot(state);
                *recorder.lock().unwrap() = Some((
                    result.is_ok(),
                    slot.data().map(|data| data.total_requests),
                    slot.is_loading(),
                ));
            })
            .await;

        assert!(outcome.is_success());
        assert_eq!(*seen.lock().unwrap(), Some((true, Some(42), false)));
    }

    #[tokio::test]
    async fn test_settle_receives_the_recorded_failure() {
        let store = store();
        let fetcher = fetcher(
            &store,
            Err(BackendError::Http {
                status: 503,
                message: "draining".to_string(),
            }),
        );
        let seen = Arc::new(Mutex::new(None));

        let recorder = Arc::clone(&seen);
        let outcome = fetcher
            .fetch_with(&CancellationToken::new(), move |_, result| {
                *recorder.lock().unwrap() = result.err().map(ToString::to_string);
            })
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Committed(Err(DashboardError::TransportError {
                message: "HTTP 503: draining".to_string()
            }))
        );
        assert_eq!(seen.lock().unwrap().as_deref(), Some("HTTP 503: draining"));
        assert!(store.read(|state| state.analytics().error().is_some()));
    }

    #[tokio::test]
    async fn test_settle_skipped_when_discarded() {
        let store = store();
        let fetcher = fetcher(&store, Ok(summary(1)));
        let token = CancellationToken::new();
        token.cancel();
        let called = Arc::new(Mutex::new(false));

        let recorder = Arc::clone(&called);
        let outcome = fetcher
            .fetch_with(&token, move |_, _| {
                *recorder.lock().unwrap() = true;
            })
            .await;

        assert_eq!(outcome, FetchOutcome::Discarded);
        assert!(!*called.lock().unwrap());
        assert!(store.read(|state| state.analytics().data().is_none()));
    }
}
