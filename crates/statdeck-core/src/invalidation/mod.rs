//! Which resources a mutating action invalidates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DashboardError;
use crate::resources::types::ResourceName;

/// A mutating action offered by the stats service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ClearCache,
    ResetMetrics,
}

impl MutationKind {
    pub const ALL: [MutationKind; 2] = [MutationKind::ClearCache, MutationKind::ResetMetrics];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::ClearCache => "clearCache",
            MutationKind::ResetMetrics => "resetMetrics",
        }
    }

    /// Resources whose data the action changes. Nothing outside this set is
    /// refreshed after the action.
    pub fn affected_resources(&self) -> &'static [ResourceName] {
        match self {
            MutationKind::ClearCache => &[
                ResourceName::ComprehensiveStats,
                ResourceName::EmbeddingDetails,
            ],
            MutationKind::ResetMetrics => &[ResourceName::AdvancedStats],
        }
    }

    pub fn affected_set(&self) -> BTreeSet<ResourceName> {
        self.affected_resources().iter().copied().collect()
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "clearcache" => Ok(MutationKind::ClearCache),
            "resetmetrics" => Ok(MutationKind::ResetMetrics),
            _ => Err(DashboardError::UnknownMutation {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_cache_affects_overview_and_embeddings() {
        let affected = MutationKind::ClearCache.affected_set();
        assert_eq!(
            affected,
            BTreeSet::from([
                ResourceName::ComprehensiveStats,
                ResourceName::EmbeddingDetails
            ])
        );
    }

    #[test]
    fn test_reset_metrics_affects_advanced_stats_only() {
        assert_eq!(
            MutationKind::ResetMetrics.affected_resources(),
            &[ResourceName::AdvancedStats]
        );
    }

    #[test]
    fn test_affected_resources_are_tracked() {
        for kind in MutationKind::ALL {
            for name in kind.affected_resources() {
                assert!(ResourceName::TRACKED.contains(name), "{kind} -> {name}");
            }
        }
    }

    #[test]
    fn test_parse_accepts_cli_spellings() {
        assert_eq!(
            "clear-cache".parse::<MutationKind>().unwrap(),
            MutationKind::ClearCache
        );
        assert_eq!(
            "resetMetrics".parse::<MutationKind>().unwrap(),
            MutationKind::ResetMetrics
        );
        assert!(matches!(
            "drop-tables".parse::<MutationKind>(),
            Err(DashboardError::UnknownMutation { .. })
        ));
    }
}
