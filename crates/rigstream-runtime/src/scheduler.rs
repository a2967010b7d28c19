//! Periodic scheduler
//!
//! Owns the clock of the assembly cycle: a fixed-interval tick that calls the
//! supplied closure until it breaks or the scheduler is cancelled. Late ticks
//! are skipped rather than bunched up.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct Scheduler {
    period: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Scheduler {
            period,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop when `cancel` fires
    pub fn with_cancel(period: Duration, cancel: CancellationToken) -> Self {
        Scheduler { period, cancel }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Call `on_tick` with the tick number once per period. Returns the
    /// number of ticks delivered.
    pub async fn run<F>(&self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> ControlFlow<()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    ticks += 1;
                    if on_tick(ticks).is_break() {
                        break;
                    }
                }
            }
        }
        debug!(ticks, "scheduler stopped");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_break() {
        let scheduler = Scheduler::new(Duration::from_millis(40));
        let start = tokio::time::Instant::now();
        let ticks = scheduler
            .run(|n| {
                if n == 5 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        assert_eq!(ticks, 5);
        // First tick fires immediately
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(160) && elapsed < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let scheduler = Scheduler::new(Duration::from_millis(10));
        let token = scheduler.cancel_token();
        let ticks = scheduler
            .run(|n| {
                if n == 3 {
                    token.cancel();
                }
                ControlFlow::Continue(())
            })
            .await;
        assert_eq!(ticks, 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let scheduler = Scheduler::new(Duration::from_millis(10));
        scheduler.stop();
        assert_eq!(scheduler.run(|_| ControlFlow::Continue(())).await, 0);
    }
}
