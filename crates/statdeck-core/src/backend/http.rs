//! `StatsBackend` over HTTP/JSON.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use statdeck_config::BackendConfig;
use tracing::{debug, warn};

use super::errors::BackendError;
use super::types::{
    AdvancedCacheStats, AnalyticsSummary, BasicStats, ComprehensiveStats, EmbeddingDetails,
    UserActivity,
};
use super::{BackendResult, StatsBackend};

const COMPREHENSIVE_STATS_PATH: &str = "/api/stats/comprehensive";
const BASIC_STATS_PATH: &str = "/api/stats";
const EMBEDDING_DETAILS_PATH: &str = "/api/embeddings/details";
const ADVANCED_STATS_PATH: &str = "/api/cache/advanced-stats";
const ANALYTICS_PATH: &str = "/api/analytics";
const USER_ACTIVITY_PATH: &str = "/api/users/activity";
const CLEAR_CACHE_PATH: &str = "/api/cache/clear";
const RESET_METRICS_PATH: &str = "/api/metrics/reset";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Longest error body excerpt carried into a `BackendError::Http` message.
const MAX_ERROR_EXCERPT: usize = 200;

/// HTTP client for the stats service.
///
/// Sends the access token as a bearer header when one is configured. The
/// token is consumed as given; obtaining or renewing it is not handled here.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        if access_token.is_none() {
            warn!(
                event = "core.backend.token_missing",
                base_url = %base_url,
                "No access token configured; requests are sent unauthenticated"
            );
        }

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    /// Build a client from the `[backend]` config section.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            config.base_url(),
            config.access_token(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        debug!(event = "core.backend.request_started", method = "GET", path = path);

        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        let response = check_status(response).await?;
        let body = response.json::<T>().await?;

        debug!(event = "core.backend.request_completed", method = "GET", path = path);
        Ok(body)
    }

    async fn post(&self, path: &str) -> BackendResult<()> {
        debug!(event = "core.backend.request_started", method = "POST", path = path);

        let response = self
            .authorize(self.client.post(self.url(path)))
            .send()
            .await?;
        check_status(response).await?;

        debug!(event = "core.backend.request_completed", method = "POST", path = path);
        Ok(())
    }
}

/// Turn a non-2xx response into `BackendError::Http`, keeping the service's
/// own error message when it sent one.
async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(BackendError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Extract a human-readable message from an error body.
///
/// Understands `{"detail": ..}`, `{"error": ..}` and `{"message": ..}`;
/// otherwise falls back to a truncated plain-text excerpt.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return Some(text.clone());
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_ERROR_EXCERPT).collect())
}

impl StatsBackend for HttpBackend {
    fn comprehensive_stats(&self) -> BoxFuture<'_, BackendResult<ComprehensiveStats>> {
        Box::pin(self.get_json(COMPREHENSIVE_STATS_PATH))
    }

    fn basic_stats(&self) -> BoxFuture<'_, BackendResult<BasicStats>> {
        Box::pin(self.get_json(BASIC_STATS_PATH))
    }

    fn embedding_details(&self) -> BoxFuture<'_, BackendResult<EmbeddingDetails>> {
        Box::pin(self.get_json(EMBEDDING_DETAILS_PATH))
    }

    fn advanced_stats(&self) -> BoxFuture<'_, BackendResult<AdvancedCacheStats>> {
        Box::pin(self.get_json(ADVANCED_STATS_PATH))
    }

    fn analytics(&self) -> BoxFuture<'_, BackendResult<AnalyticsSummary>> {
        Box::pin(self.get_json(ANALYTICS_PATH))
    }

    fn user_activity(&self) -> BoxFuture<'_, BackendResult<UserActivity>> {
        Box::pin(self.get_json(USER_ACTIVITY_PATH))
    }

    fn clear_cache(&self) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(self.post(CLEAR_CACHE_PATH))
    }

    fn reset_metrics(&self) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(self.post(RESET_METRICS_PATH))
    }
}
