//! Tick/shutdown plumbing shared by the periodic tasks.

use core::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Fixed-period ticker that can be interrupted by a shutdown flag
pub(crate) struct Periodic {
    ticker: Interval,
    shutdown: watch::Receiver<bool>,
}

impl Periodic {
    /// First tick fires immediately. A slow cycle pushes later ticks back
    /// instead of bursting to catch up.
    pub(crate) fn new(period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { ticker, shutdown }
    }

    /// Wait for the next tick. Returns `false` once shutdown is requested
    /// or the shutdown sender is gone.
    pub(crate) async fn tick(&mut self) -> bool {
        if *self.shutdown.borrow() {
            return false;
        }

        tokio::select! {
            _ = self.ticker.tick() => {}
            changed = self.shutdown.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }

        !*self.shutdown.borrow()
    }
}
