//! Rich/degraded resource pairing.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dashboard::store::DashboardState;
use crate::errors::DashboardError;
use crate::resources::fetcher::{FetchOutcome, ResourceFetcher};
use crate::resources::types::ResourceState;

/// Which half of a fallback pair is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    #[default]
    Rich,
    Degraded,
}

/// The data a fallback pair currently presents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "source", content = "data", rename_all = "camelCase")]
pub enum Effective<'a, R, D> {
    Rich(&'a R),
    Degraded(&'a D),
}

/// A rich resource and its degraded stand-in.
///
/// A failed rich fetch never erases the last good rich value; only `source`
/// flips. `effective` is therefore never `None` once either side has
/// succeeded once.
#[derive(Debug, Clone)]
pub struct FallbackPair<R, D> {
    pub(crate) rich: ResourceState<R>,
    pub(crate) degraded: ResourceState<D>,
    pub(crate) source: Source,
    pub(crate) error: Option<DashboardError>,
}

impl<R, D> Default for FallbackPair<R, D> {
    fn default() -> Self {
        Self {
            rich: ResourceState::default(),
            degraded: ResourceState::default(),
            source: Source::Rich,
            error: None,
        }
    }
}

impl<R, D> FallbackPair<R, D> {
    pub fn rich(&self) -> &ResourceState<R> {
        &self.rich
    }

    pub fn degraded(&self) -> &ResourceState<D> {
        &self.degraded
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Pair-level failure, set only when both halves failed.
    pub fn error(&self) -> Option<&DashboardError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.rich.is_loading() || self.degraded.is_loading()
    }

    pub fn effective(&self) -> Option<Effective<'_, R, D>> {
        let rich = self.rich.data().map(Effective::Rich);
        let degraded = self.degraded.data().map(Effective::Degraded);
        match self.source {
            Source::Rich => rich.or(degraded),
            Source::Degraded => degraded.or(rich),
        }
    }

    /// Most recent successful fetch of either half.
    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.rich.last_fetched_at().max(self.degraded.last_fetched_at())
    }

    pub fn fetched_instant(&self) -> Option<Instant> {
        self.rich.fetched_instant().max(self.degraded.fetched_instant())
    }

    pub(crate) fn promote(&mut self, source: Source) {
        self.source = source;
        self.error = None;
    }
}

impl<R: Serialize, D: Serialize> Serialize for FallbackPair<R, D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FallbackPair", 7)?;
        s.serialize_field("effective", &self.effective())?;
        s.serialize_field("source", &self.source)?;
        s.serialize_field("loading", &self.is_loading())?;
        s.serialize_field("error", &self.error)?;
        s.serialize_field("lastFetchedAt", &self.last_fetched_at())?;
        s.serialize_field("rich", &self.rich)?;
        s.serialize_field("degraded", &self.degraded)?;
        s.end()
    }
}

/// How a fallback resolution settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    Resolved(Source),
    Failed(DashboardError),
    Discarded,
}

impl FallbackOutcome {
    pub fn into_result(self) -> Result<(), DashboardError> {
        match self {
            FallbackOutcome::Failed(error) => Err(error),
            FallbackOutcome::Resolved(_) | FallbackOutcome::Discarded => Ok(()),
        }
    }
}

/// Locates the fallback pair inside the dashboard state.
pub type PairSlot<R, D> = fn(&mut DashboardState) -> &mut FallbackPair<R, D>;

/// Fetches the rich half, consulting the degraded half only on failure.
pub struct FallbackResolver<R, D> {
    rich: ResourceFetcher<R>,
    degraded: ResourceFetcher<D>,
    pair: PairSlot<R, D>,
}

impl<R: Send + 'static, D: Send + 'static> FallbackResolver<R, D> {
    pub fn new(
        rich: ResourceFetcher<R>,
        degraded: ResourceFetcher<D>,
        pair: PairSlot<R, D>,
    ) -> Self {
        Self {
            rich,
            degraded,
            pair,
        }
    }

    pub async fn resolve(&self, token: &CancellationToken) -> FallbackOutcome {
        let pair = self.pair;

        let rich = self
            .rich
            .fetch_with(token, move |state, result| {
                if result.is_ok() {
                    pair(state).promote(Source::Rich);
                }
            })
            .await;
        let rich_error = match rich {
            FetchOutcome::Discarded => return FallbackOutcome::Discarded,
            FetchOutcome::Committed(Ok(())) => return FallbackOutcome::Resolved(Source::Rich),
            FetchOutcome::Committed(Err(error)) => error,
        };

        info!(
            event = "core.fallback.degraded_started",
            resource = %self.rich.name(),
            fallback = %self.degraded.name(),
            error = %rich_error,
        );

        let rich_message = rich_error.to_string();
        let degraded = self
            .degraded
            .fetch_with(token, move |state, result| match result {
                Ok(()) => pair(state).promote(Source::Degraded),
                Err(degraded_error) => {
                    pair(state).error = Some(unavailable(rich_message, degraded_error))
                }
            })
            .await;

        match degraded {
            FetchOutcome::Discarded => FallbackOutcome::Discarded,
            FetchOutcome::Committed(Ok(())) => FallbackOutcome::Resolved(Source::Degraded),
            FetchOutcome::Committed(Err(degraded_error)) => {
                let error = unavailable(rich_error.to_string(), &degraded_error);
                warn!(
                    event = "core.fallback.unavailable",
                    resource = %self.rich.name(),
                    error = %error,
                );
                FallbackOutcome::Failed(error)
            }
        }
    }
}

fn unavailable(rich: String, degraded: &DashboardError) -> DashboardError {
    DashboardError::DegradedUnavailable {
        rich,
        degraded: degraded.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(message: &str) -> DashboardError {
        DashboardError::TransportError {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_effective_none_until_resolved() {
        let pair: FallbackPair<u32, &str> = FallbackPair::default();
        assert!(pair.effective().is_none());
        assert_eq!(pair.source(), Source::Rich);
    }

    #[test]
    fn test_effective_prefers_authoritative_side() {
        let mut pair: FallbackPair<u32, &str> = FallbackPair::default();
        pair.rich.commit_success(10, Utc::now(), Instant::now());
        pair.degraded.commit_success("basic", Utc::now(), Instant::now());

        assert_eq!(pair.effective(), Some(Effective::Rich(&10)));

        pair.promote(Source::Degraded);
        assert_eq!(pair.effective(), Some(Effective::Degraded(&"basic")));
    }

    #[test]
    fn test_rich_failure_keeps_rich_data_visible() {
        let mut pair: FallbackPair<u32, &str> = FallbackPair::default();
        pair.rich.commit_success(10, Utc::now(), Instant::now());
        pair.rich.commit_failure(transport("down"));

        // Degraded side never resolved, so the stale rich value remains.
        pair.promote(Source::Degraded);
        assert_eq!(pair.effective(), Some(Effective::Rich(&10)));
    }

    #[test]
    fn test_promote_clears_pair_error() {
        let mut pair: FallbackPair<u32, &str> = FallbackPair::default();
        pair.error = Some(DashboardError::DegradedUnavailable {
            rich: "a".to_string(),
            degraded: "b".to_string(),
        });
        pair.promote(Source::Rich);
        assert!(pair.error().is_none());
    }

    #[test]
    fn test_serializes_effective_with_source_tag() {
        let mut pair: FallbackPair<u32, String> = FallbackPair::default();
        pair.degraded
            .commit_success("basic".to_string(), Utc::now(), Instant::now());
        pair.promote(Source::Degraded);

        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["source"], "degraded");
        assert_eq!(json["effective"]["source"], "degraded");
        assert_eq!(json["effective"]["data"], "basic");
        assert_eq!(json["loading"], false);
    }
}
