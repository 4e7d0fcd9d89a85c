//! Staleness checks.

use std::time::Duration;

use tokio::time::Instant;

/// Whether data fetched at `last_fetched` has outlived `max_age` at `now`.
///
/// Never-fetched data is always stale. Data exactly `max_age` old is still
/// fresh.
pub fn is_stale(last_fetched: Option<Instant>, max_age: Duration, now: Instant) -> bool {
    match last_fetched {
        None => true,
        Some(at) => now.saturating_duration_since(at) > max_age,
    }
}

/// Staleness threshold derived from a refresh period.
///
/// Nine tenths of the period: data fetched just after one tick is due again
/// at the next, while data refreshed manually between ticks is skipped.
pub fn interval_max_age(interval: Duration) -> Duration {
    interval - interval / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_fetched_is_stale() {
        assert!(is_stale(None, Duration::from_secs(60), Instant::now()));
    }

    #[test]
    fn test_freshly_fetched_is_not_stale() {
        let now = Instant::now();
        assert!(!is_stale(Some(now), Duration::from_secs(30), now));
    }

    #[test]
    fn test_boundary_is_fresh() {
        let at = Instant::now();
        let max_age = Duration::from_secs(30);
        assert!(!is_stale(Some(at), max_age, at + max_age));
        assert!(is_stale(
            Some(at),
            max_age,
            at + max_age + Duration::from_millis(1)
        ));
    }

    #[test]
    fn test_zero_max_age_is_stale_after_any_time() {
        let at = Instant::now();
        assert!(is_stale(
            Some(at),
            Duration::ZERO,
            at + Duration::from_millis(1)
        ));
    }

    #[test]
    fn test_interval_threshold_puts_next_tick_on_stale_side() {
        let interval = Duration::from_secs(30);
        let threshold = interval_max_age(interval);
        assert_eq!(threshold, Duration::from_secs(27));

        let fetched = Instant::now();
        // The fetch settled a little after the tick that started it.
        let next_tick = fetched + interval - Duration::from_millis(200);
        assert!(is_stale(Some(fetched), threshold, next_tick));
        assert!(!is_stale(
            Some(fetched),
            threshold,
            fetched + Duration::from_secs(5)
        ));
    }
}
