//! Progress clock
//!
//! Advances the displayed playback position between backend position
//! reports by accumulating wall-clock deltas on a fixed tick. The clock
//! itself owns no position state; each tick hands the elapsed delta to its
//! driver, which applies it under the state lock and decides whether the
//! track ended. Ticks that fall inside an interactive lock still consume
//! their delta (the driver re-baselines), so no time is double-counted
//! when the lock releases.

use async_trait::async_trait;
use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// What a tick decided while holding the state lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickAction {
    /// Keep ticking
    Continue,

    /// Track end in loop-single mode: the position was reset, a backend
    /// seek-to-zero is due
    LoopRestart,

    /// Track end: advance to the next track and retire this ticker
    Advance,
}

/// The clock's view of the transport controller
#[async_trait]
pub(crate) trait ClockDriver: Send + Sync + 'static {
    /// Apply one elapsed-time delta and decide what happens next.
    /// Must not block or suspend.
    fn apply_tick(&self, dt: Duration) -> TickAction;

    /// Issue the loop-single backend seek-to-zero
    async fn on_loop_restart(&self);

    /// Hand off the track advance. Must not block: the ticker is retiring
    /// and the advance restarts the clock through the normal load path.
    fn on_track_end(&self);
}

/// Restartable progress ticker
///
/// Single-instance-at-a-time: `start` aborts the previous ticker task and
/// resets the baseline rather than stacking a second one.
pub(crate) struct ProgressClock {
    tick: Duration,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl ProgressClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            task: StdMutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start (or restart) ticking against the given driver
    pub fn start(&self, driver: Weak<dyn ClockDriver>) {
        let mut slot = self.slot();
        if let Some(old) = slot.take() {
            old.abort();
        }
        *slot = Some(tokio::spawn(run_clock(self.tick, driver)));
    }

    /// Stop ticking
    pub fn stop(&self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }

    /// Whether a ticker task is alive
    pub fn is_running(&self) -> bool {
        self.slot().as_ref().is_some_and(|t| !t.is_finished())
    }
}

async fn run_clock(tick: Duration, driver: Weak<dyn ClockDriver>) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately; it only establishes the baseline.
    ticker.tick().await;
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let Some(driver) = driver.upgrade() else {
            return;
        };

        let now = Instant::now();
        let dt = now - last;
        last = now;

        match driver.apply_tick(dt) {
            TickAction::Continue => {}
            TickAction::LoopRestart => driver.on_loop_restart().await,
            TickAction::Advance => {
                driver.on_track_end();
                return;
            }
        }
    }
}
