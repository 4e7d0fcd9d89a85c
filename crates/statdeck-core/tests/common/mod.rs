//! In-memory stats backend with scripted, optionally gated replies.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use statdeck_core::backend::{
    AdvancedCacheStats, AnalyticsSummary, BackendError, BackendResult, BasicStats,
    ComprehensiveStats, EmbeddingDetails, StatsBackend, UserActivity,
};
use statdeck_core::{Dashboard, DashboardOptions};
use tokio::sync::oneshot;

pub const COMPREHENSIVE: &str = "comprehensive";
pub const BASIC: &str = "basic";
pub const EMBEDDINGS: &str = "embeddings";
pub const ADVANCED: &str = "advanced";
pub const ANALYTICS: &str = "analytics";
pub const USERS: &str = "users";
pub const CLEAR_CACHE: &str = "clear_cache";
pub const RESET_METRICS: &str = "reset_metrics";

pub const READS: [&str; 6] = [COMPREHENSIVE, BASIC, EMBEDDINGS, ADVANCED, ANALYTICS, USERS];

pub type Reply = Result<Value, BackendError>;

enum Scripted {
    Now(Reply),
    Gated(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct Endpoint {
    calls: usize,
    queue: VecDeque<Scripted>,
    default: Option<Reply>,
}

/// Answers every read from a per-endpoint script.
///
/// Queued replies are used first, in order; after that the endpoint's
/// default reply repeats. Calls are counted when the backend method is
/// invoked.
#[derive(Default)]
pub struct ScriptedBackend {
    endpoints: Mutex<HashMap<&'static str, Endpoint>>,
}

impl ScriptedBackend {
    /// Every endpoint answers successfully with a small payload.
    pub fn healthy() -> Arc<Self> {
        let backend = Self::default();
        backend.respond(COMPREHENSIVE, Ok(json!({"total_documents": 120, "total_chunks": 900})));
        backend.respond(BASIC, Ok(json!({"total_documents": 120})));
        backend.respond(EMBEDDINGS, Ok(json!({"model": "mini", "total_embeddings": 900})));
        backend.respond(ADVANCED, Ok(json!({"hits": 9, "misses": 1})));
        backend.respond(ANALYTICS, Ok(json!({"total_requests": 42})));
        backend.respond(USERS, Ok(json!({"active_users": 3, "total_users": 10})));
        backend.respond(CLEAR_CACHE, Ok(json!({})));
        backend.respond(RESET_METRICS, Ok(json!({})));
        Arc::new(backend)
    }

    pub fn respond(&self, endpoint: &'static str, reply: Reply) {
        self.endpoints
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .default = Some(reply);
    }

    /// Queue a one-off reply ahead of the default.
    pub fn push(&self, endpoint: &'static str, reply: Reply) {
        self.endpoints
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .queue
            .push_back(Scripted::Now(reply));
    }

    /// Queue a reply that is held until the returned sender fires.
    pub fn gate(&self, endpoint: &'static str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.endpoints
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .queue
            .push_back(Scripted::Gated(rx));
        tx
    }

    pub fn calls(&self, endpoint: &'static str) -> usize {
        self.endpoints
            .lock()
            .unwrap()
            .get(endpoint)
            .map_or(0, |e| e.calls)
    }

    pub fn all_calls(&self) -> HashMap<&'static str, usize> {
        READS.iter().map(|name| (*name, self.calls(name))).collect()
    }

    fn call<T: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &'static str,
    ) -> BoxFuture<'_, BackendResult<T>> {
        let scripted = {
            let mut endpoints = self.endpoints.lock().unwrap();
            let entry = endpoints.entry(endpoint).or_default();
            entry.calls += 1;
            entry.queue.pop_front().unwrap_or_else(|| {
                Scripted::Now(entry.default.clone().unwrap_or_else(|| {
                    Err(BackendError::Request {
                        message: format!("no scripted reply for {endpoint}"),
                    })
                }))
            })
        };

        Box::pin(async move {
            let value = match scripted {
                Scripted::Now(reply) => reply?,
                Scripted::Gated(rx) => rx.await.unwrap_or_else(|_| {
                    Err(BackendError::Request {
                        message: "gate dropped".to_string(),
                    })
                })?,
            };
            serde_json::from_value(value).map_err(|e| BackendError::Decode {
                message: e.to_string(),
            })
        })
    }

    fn mutate(&self, endpoint: &'static str) -> BoxFuture<'_, BackendResult<()>> {
        let reply = self.call::<Value>(endpoint);
        Box::pin(async move { reply.await.map(|_| ()) })
    }
}

impl StatsBackend for ScriptedBackend {
    fn comprehensive_stats(&self) -> BoxFuture<'_, BackendResult<ComprehensiveStats>> {
        self.call(COMPREHENSIVE)
    }

    fn basic_stats(&self) -> BoxFuture<'_, BackendResult<BasicStats>> {
        self.call(BASIC)
    }

    fn embedding_details(&self) -> BoxFuture<'_, BackendResult<EmbeddingDetails>> {
        self.call(EMBEDDINGS)
    }

    fn advanced_stats(&self) -> BoxFuture<'_, BackendResult<AdvancedCacheStats>> {
        self.call(ADVANCED)
    }

    fn analytics(&self) -> BoxFuture<'_, BackendResult<AnalyticsSummary>> {
        self.call(ANALYTICS)
    }

    fn user_activity(&self) -> BoxFuture<'_, BackendResult<UserActivity>> {
        self.call(USERS)
    }

    fn clear_cache(&self) -> BoxFuture<'_, BackendResult<()>> {
        self.mutate(CLEAR_CACHE)
    }

    fn reset_metrics(&self) -> BoxFuture<'_, BackendResult<()>> {
        self.mutate(RESET_METRICS)
    }
}

pub fn http_error(status: u16, message: &str) -> Reply {
    Err(BackendError::Http {
        status,
        message: message.to_string(),
    })
}

pub fn options(max_age: Duration) -> DashboardOptions {
    DashboardOptions {
        auto_refresh: false,
        interval: Duration::from_secs(10),
        max_age: Some(max_age),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn dashboard(backend: &Arc<ScriptedBackend>, max_age: Duration) -> Dashboard {
    Dashboard::new(backend.clone(), options(max_age)).unwrap()
}

/// Yield until `endpoint` has been called at least `count` times.
pub async fn wait_for_calls(backend: &ScriptedBackend, endpoint: &'static str, count: usize) {
    for _ in 0..1_000 {
        if backend.calls(endpoint) >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "{endpoint} called {} times, expected {count}",
        backend.calls(endpoint)
    );
}
