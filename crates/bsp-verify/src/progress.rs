use std::time::{Duration, Instant};

use tracing::info;

/// Emits a progress record at most once per interval.
///
/// Purely a side channel: ticking never changes what is verified.
#[derive(Debug)]
pub struct ProgressTicker {
    interval: Duration,
    started: Instant,
    last: Instant,
}

impl ProgressTicker {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            started: now,
            last: now,
        }
    }

    /// Log progress if the interval has elapsed. Returns whether it logged.
    pub fn tick(&mut self, done: u64, total: u64) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 * 100.0 / total as f64
        };
        info!(
            done,
            total,
            percent = (percent * 10.0).round() / 10.0,
            elapsed_secs = self.started.elapsed().as_secs(),
            "verification progress"
        );
        true
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
