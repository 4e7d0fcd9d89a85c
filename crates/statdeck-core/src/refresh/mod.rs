//! When and how often resources are re-fetched.

pub mod coordinator;
pub mod freshness;
pub mod scheduler;

pub use coordinator::{RefreshCoordinator, RefreshRegistration, RefreshTicket};
pub use freshness::{interval_max_age, is_stale};
pub use scheduler::{
    AutoRefreshConfig, AutoRefreshHandle, MIN_REFRESH_INTERVAL, RefreshScheduler,
    SchedulerState, TickCallback, validate_interval,
};
