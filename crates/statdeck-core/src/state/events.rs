use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::invalidation::MutationKind;
use crate::resources::types::ResourceName;

/// What a dispatched command changed.
///
/// Failures travel through the `Err` channel, never as events. Fetch
/// results are not events either; they arrive through the snapshot feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Refreshes were started for these resources.
    RefreshStarted { resources: Vec<ResourceName> },
    AutoRefreshChanged { enabled: bool },
    RefreshIntervalChanged { interval_ms: u64 },
    /// A mutation invalidated these resources and their refresh started.
    ResourcesInvalidated {
        kind: MutationKind,
        resources: BTreeSet<ResourceName>,
    },
    /// An in-flight refresh was cancelled without replacement.
    RefreshCancelled { resource: ResourceName },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_roundtrip() {
        let event = Event::ResourcesInvalidated {
            kind: MutationKind::ClearCache,
            resources: MutationKind::ClearCache.affected_set(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_refresh_started_lists_resources_camel_case() {
        let event = Event::RefreshStarted {
            resources: vec![ResourceName::UserActivity],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["RefreshStarted"]["resources"][0], "userActivity");
    }
}
