use serde::{Deserialize, Serialize};

use crate::invalidation::MutationKind;
use crate::resources::types::ResourceName;

/// Every operation a front end can ask of the dashboard.
///
/// Commands are plain data so they can be parsed from a console line,
/// serialized, or queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Refresh every tracked resource. Resources already in flight are left
    /// to finish.
    ManualRefresh,
    /// Refresh every tracked resource, superseding in-flight refreshes.
    ForcedRefresh,
    SetAutoRefresh { enabled: bool },
    /// Must be at least 10 000 ms.
    SetRefreshInterval { interval_ms: u64 },
    /// A mutation already happened elsewhere; refresh what it affected.
    NotifyMutation { kind: MutationKind },
    /// Run the mutation against the backend, then refresh what it affected.
    PerformMutation { kind: MutationKind },
    Cancel { resource: ResourceName },
}
