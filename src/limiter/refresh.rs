//! Periodic state refresh.
//!
//! Derived fields like `time_until_reset` go stale just by time passing,
//! so a limiter that feeds a display is refreshed on a fixed tick. The
//! task is owned by a handle and stops when the handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::record::LimitState;
use super::window::SlidingWindowLimiter;

/// Default refresh period.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running refresh task.
///
/// Holds the latest derived state and republishes it on every tick.
/// Dropping the handle aborts the task, so a torn-down consumer cannot
/// leak its timer.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    rx: watch::Receiver<LimitState>,
}

impl RefreshHandle {
    /// Spawn a refresh task over `limiter` ticking at `period`.
    ///
    /// The first refresh happens immediately, so the published state is
    /// valid as soon as this returns.
    pub fn spawn(limiter: Arc<SlidingWindowLimiter>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(limiter.refresh());
        let name = limiter.config().name.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The immediate first tick duplicates the refresh above.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let state = limiter.refresh();
                if tx.send(state).is_err() {
                    debug!(name = %name, "All refresh watchers dropped, stopping");
                    break;
                }
            }
        });

        Self { task, rx }
    }

    /// Spawn with the default 1-second period.
    pub fn spawn_default(limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self::spawn(limiter, REFRESH_PERIOD)
    }

    /// Snapshot of the most recently published state.
    pub fn state(&self) -> LimitState {
        *self.rx.borrow()
    }

    /// Subscribe to state updates.
    pub fn subscribe(&self) -> watch::Receiver<LimitState> {
        self.rx.clone()
    }

    /// Stop the refresh task.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LimitConfig;
    use crate::storage::MemoryStorage;

    fn paused_limiter(clock: ManualClock) -> Arc<SlidingWindowLimiter> {
        Arc::new(SlidingWindowLimiter::with_clock(
            LimitConfig::new("refresh", 3, Duration::from_millis(10_000)),
            Arc::new(MemoryStorage::new()),
            Arc::new(clock),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_published_immediately() {
        let limiter = paused_limiter(ManualClock::new(0));
        let handle = RefreshHandle::spawn(limiter, Duration::from_secs(1));

        let state = handle.state();
        assert!(state.can_proceed);
        assert_eq!(state.remaining_requests, 3);
        assert_eq!(state.time_until_reset, 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_tracks_passing_time() {
        let clock = ManualClock::new(0);
        let limiter = paused_limiter(clock.clone());
        let handle = RefreshHandle::spawn(limiter.clone(), Duration::from_secs(1));
        let mut rx = handle.subscribe();

        clock.set(3_000);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().time_until_reset, 7_000);

        // A recorded request shows up on the next tick.
        limiter.record_request();
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(rx.borrow().remaining_requests, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_task() {
        let limiter = paused_limiter(ManualClock::new(0));
        let handle = RefreshHandle::spawn(limiter, Duration::from_secs(1));

        handle.shutdown();

        // Dropping the handle also stops the task.
        let dropped = RefreshHandle::spawn_default(paused_limiter(ManualClock::new(0)));
        drop(dropped);

        // Give the runtime a turn; aborted tasks must not keep ticking.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
