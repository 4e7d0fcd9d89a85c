//! statdeck-core: dashboard state aggregation and refresh control
//!
//! Fetches the operational metrics of a stats service from several
//! independent endpoints and keeps them in one periodically refreshed view.
//!
//! # Main Entry Points
//!
//! - [`dashboard`] - The refresh controller ([`Dashboard`]) and its snapshots
//! - [`resources`] - Per-resource fetch lifecycle and the overview fallback pair
//! - [`refresh`] - Supersession, staleness and the auto-refresh timer
//! - [`invalidation`] - Which resources a mutation invalidates
//! - [`backend`] - The stats service boundary and its HTTP client
//! - [`state`] - Command/event surface for front ends

pub mod backend;
pub mod dashboard;
pub mod errors;
pub mod invalidation;
pub mod logging;
pub mod refresh;
pub mod resources;
pub mod state;

pub use backend::{BackendError, HttpBackend, StatsBackend};
pub use dashboard::{
    Dashboard, DashboardOptions, DashboardSnapshot, DashboardState, Invalidation, RefreshBatch,
    RefreshMode,
};
pub use errors::{DashboardError, StatdeckError, StatdeckResult};
pub use invalidation::MutationKind;
pub use refresh::{AutoRefreshConfig, RefreshRegistration, SchedulerState};
pub use resources::{Effective, FallbackPair, ResourceName, ResourceState, Source};
pub use state::{Command, Event, Store};

pub use statdeck_config::{ConfigError, StatdeckConfig};

pub use logging::init_logging;
