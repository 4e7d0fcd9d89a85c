//! Timer-driven auto-refresh.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use statdeck_config::MIN_REFRESH_INTERVAL_MS;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::DashboardError;

pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(MIN_REFRESH_INTERVAL_MS);

/// Reject periods shorter than the allowed minimum.
pub fn validate_interval(interval: Duration) -> Result<(), DashboardError> {
    if interval < MIN_REFRESH_INTERVAL {
        return Err(DashboardError::InvalidInterval {
            got_ms: interval.as_millis() as u64,
            min_ms: MIN_REFRESH_INTERVAL_MS,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRefreshConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl AutoRefreshConfig {
    pub fn new(enabled: bool, interval: Duration) -> Result<Self, DashboardError> {
        validate_interval(interval)?;
        Ok(Self {
            enabled,
            interval_ms: interval.as_millis() as u64,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug)]
struct AutoRefreshShared {
    config: AutoRefreshConfig,
    /// Bumped on every arm and disarm. A timer only fires while its own
    /// epoch is current.
    epoch: u64,
}

/// Shared view of one dashboard's auto-refresh settings.
///
/// The scheduler writes through it; the snapshot publisher only reads.
#[derive(Debug, Clone)]
pub struct AutoRefreshHandle {
    shared: Arc<Mutex<AutoRefreshShared>>,
}

impl AutoRefreshHandle {
    pub fn new(config: AutoRefreshConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(AutoRefreshShared { config, epoch: 0 })),
        }
    }

    pub fn config(&self) -> AutoRefreshConfig {
        self.lock().config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AutoRefreshShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        let shared = self.lock();
        shared.config.enabled && shared.epoch == epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    Armed,
}

/// Invoked on every live tick. Must not block.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

struct Timer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Timer {
    fn stop(self) {
        self.token.cancel();
        self.task.abort();
    }
}

/// Two-state timer: `Idle` or `Armed`.
///
/// While armed, a repeating timer calls the tick callback once per period,
/// starting one period after arming. Missed ticks are not replayed. The
/// callback runs synchronously on the timer task.
///
/// `enable` and `set_interval` spawn onto the current tokio runtime.
pub struct RefreshScheduler {
    handle: AutoRefreshHandle,
    on_tick: TickCallback,
    timer: Mutex<Option<Timer>>,
}

impl RefreshScheduler {
    pub fn new(handle: AutoRefreshHandle, on_tick: TickCallback) -> Self {
        Self {
            handle,
            on_tick,
            timer: Mutex::new(None),
        }
    }

    pub fn handle(&self) -> AutoRefreshHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> AutoRefreshConfig {
        self.handle.config()
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer_slot().is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    /// Idle → Armed. No-op when already armed.
    pub fn enable(&self) {
        let mut timer = self.timer_slot();
        if timer.is_some() {
            return;
        }

        let (epoch, period) = {
            let mut shared = self.handle.lock();
            shared.config.enabled = true;
            shared.epoch += 1;
            (shared.epoch, shared.config.interval())
        };
        *timer = Some(self.arm(epoch, period));

        info!(
            event = "core.scheduler.enabled",
            interval_ms = period.as_millis() as u64
        );
    }

    /// Armed → Idle. No-op when already idle.
    pub fn disable(&self) {
        let mut timer = self.timer_slot();
        {
            let mut shared = self.handle.lock();
            shared.config.enabled = false;
            shared.epoch += 1;
        }
        if let Some(running) = timer.take() {
            running.stop();
            info!(event = "core.scheduler.disabled");
        }
    }

    /// Change the period. An armed timer restarts with the new period.
    pub fn set_interval(&self, interval: Duration) -> Result<(), DashboardError> {
        validate_interval(interval)?;

        let mut timer = self.timer_slot();
        let epoch = {
            let mut shared = self.handle.lock();
            shared.config.interval_ms = interval.as_millis() as u64;
            if timer.is_some() {
                shared.epoch += 1;
            }
            shared.epoch
        };

        if let Some(running) = timer.take() {
            running.stop();
            *timer = Some(self.arm(epoch, interval));
        }

        info!(
            event = "core.scheduler.interval_changed",
            interval_ms = interval.as_millis() as u64,
            armed = timer.is_some(),
        );
        Ok(())
    }

    fn timer_slot(&self) -> std::sync::MutexGuard<'_, Option<Timer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm(&self, epoch: u64, period: Duration) -> Timer {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = self.handle.clone();
        let on_tick = Arc::clone(&self.on_tick);
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                if !handle.is_current(epoch) {
                    debug!(event = "core.scheduler.tick_dropped", epoch = epoch);
                    break;
                }
                debug!(event = "core.scheduler.tick", epoch = epoch);
                on_tick();
            }
        });

        Timer { token, task }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.timer_slot().take() {
            running.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_scheduler(interval: Duration) -> (RefreshScheduler, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let scheduler = RefreshScheduler::new(
            AutoRefreshHandle::new(AutoRefreshConfig::new(false, interval).unwrap()),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (scheduler, ticks)
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_interval_minimum_enforced() {
        let err = AutoRefreshConfig::new(true, Duration::from_secs(5)).unwrap_err();
        assert_eq!(
            err,
            DashboardError::InvalidInterval {
                got_ms: 5_000,
                min_ms: 10_000
            }
        );
        assert!(AutoRefreshConfig::new(true, Duration::from_secs(10)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_one_period_after_enable() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(10));
        scheduler.enable();
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        advance(Duration::from_secs(9)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        advance(Duration::from_secs(2)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        advance(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_stops_ticks() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(10));
        scheduler.enable();
        advance(Duration::from_secs(11)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        scheduler.disable();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.config().enabled);

        advance(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_toggle_does_not_double_fire() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(10));
        scheduler.enable();
        advance(Duration::from_secs(5)).await;
        scheduler.disable();
        scheduler.enable();

        // The first arming would have fired at t=10; only the second, at t=15, fires.
        advance(Duration::from_secs(6)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        advance(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_restarts_armed_timer() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(10));
        scheduler.enable();
        advance(Duration::from_secs(8)).await;

        scheduler.set_interval(Duration::from_secs(20)).unwrap();
        assert_eq!(scheduler.config().interval_ms, 20_000);

        advance(Duration::from_secs(19)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        advance(Duration::from_secs(2)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_while_idle_stays_idle() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(10));
        scheduler.set_interval(Duration::from_secs(15)).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        advance(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_interval_leaves_config_unchanged() {
        let (scheduler, _ticks) = counting_scheduler(Duration::from_secs(10));
        assert!(scheduler.set_interval(Duration::from_millis(500)).is_err());
        assert_eq!(scheduler.config().interval_ms, 10_000);
    }
}
