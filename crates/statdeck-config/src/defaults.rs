//! Built-in fallback values for every optional config field.

/// Auto-refresh may not tick faster than this.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 10_000;

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub(crate) const DEFAULT_TOKEN_ENV: &str = "STATDECK_TOKEN";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub(crate) const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;
