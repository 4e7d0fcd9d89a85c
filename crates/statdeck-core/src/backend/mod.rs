//! Remote boundary of the dashboard.
//!
//! `StatsBackend` is the only thing the refresh controller knows about the
//! stats service: one async read per resource plus the two mutations. The
//! wire format belongs to the implementation (`HttpBackend` in production,
//! scripted backends in tests).

pub mod errors;
pub mod http;
pub mod types;

use futures::future::BoxFuture;

pub use errors::BackendError;
pub use http::HttpBackend;
pub use types::{
    ActivityEntry, AdvancedCacheStats, AnalyticsSummary, BasicStats, ComprehensiveStats,
    EmbeddingDetails, UserActivity,
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Reads and mutations offered by the stats service.
///
/// Implementations must not panic; every failure is a `BackendError`.
pub trait StatsBackend: Send + Sync + 'static {
    fn comprehensive_stats(&self) -> BoxFuture<'_, BackendResult<ComprehensiveStats>>;

    fn basic_stats(&self) -> BoxFuture<'_, BackendResult<BasicStats>>;

    fn embedding_details(&self) -> BoxFuture<'_, BackendResult<EmbeddingDetails>>;

    fn advanced_stats(&self) -> BoxFuture<'_, BackendResult<AdvancedCacheStats>>;

    fn analytics(&self) -> BoxFuture<'_, BackendResult<AnalyticsSummary>>;

    fn user_activity(&self) -> BoxFuture<'_, BackendResult<UserActivity>>;

    fn clear_cache(&self) -> BoxFuture<'_, BackendResult<()>>;

    fn reset_metrics(&self) -> BoxFuture<'_, BackendResult<()>>;
}
