//! Payloads returned by the stats service.
//!
//! Known fields are typed and default to zero/empty when absent. Anything the
//! service adds beyond them lands in `extra`, so a newer backend never breaks
//! decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full overview: document counts plus index and cache summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComprehensiveStats {
    pub total_documents: u64,
    pub total_chunks: u64,
    pub index_size_bytes: u64,
    pub cache_entries: u64,
    pub cache_hit_rate: Option<f64>,
    pub embedding_model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Degraded overview served by the lightweight stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicStats {
    pub total_documents: u64,
    pub total_chunks: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingDetails {
    pub model: Option<String>,
    pub dimensions: Option<u32>,
    pub total_embeddings: u64,
    pub cached_embeddings: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: u64,
    pub memory_bytes: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdvancedCacheStats {
    /// Fraction of lookups served from cache, `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSummary {
    pub total_requests: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub requests_per_minute: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserActivity {
    pub active_users: u64,
    pub total_users: u64,
    pub recent: Vec<ActivityEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityEntry {
    pub user: String,
    pub action: String,
    pub at: Option<String>,
}
