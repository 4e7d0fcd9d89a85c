//! The refresh controller and the state it owns.

pub mod controller;
pub mod snapshot;
pub mod store;

pub use controller::{Dashboard, DashboardOptions, Invalidation, RefreshBatch, RefreshMode};
pub use snapshot::DashboardSnapshot;
pub use store::{DashboardState, DashboardStore};
