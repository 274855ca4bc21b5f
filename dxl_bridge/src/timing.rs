//! Absolute-deadline interval timer.
//!
//! The control period is held by sleeping until an absolute deadline, not
//! for a fixed duration, so per-cycle processing time does not accumulate
//! into drift. A deadline already in the past returns immediately and the
//! loop proceeds.

use std::time::{Duration, Instant};

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalStats {
    /// Intervals recorded since the last reset
    pub cycles: u64,
    /// Last achieved interval
    pub last: Duration,
    /// Maximum achieved interval
    pub max: Duration,
}

/// Fixed-period timer with jitter tracking.
#[derive(Debug)]
pub struct IntervalTimer {
    period: Duration,
    deadline: Instant,
    last_sync: Instant,
    stats: IntervalStats,
}

impl IntervalTimer {
    /// Create a timer for the given nominal period.
    pub fn new(period: Duration) -> Self {
        let now = Instant::now();
        Self {
            period,
            deadline: now,
            last_sync: now,
            stats: IntervalStats::default(),
        }
    }

    /// The nominal period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Anchor the deadline chain at the current instant.
    pub fn start(&mut self) {
        let now = Instant::now();
        self.deadline = now;
        self.last_sync = now;
    }

    /// Advance the deadline by one period and sleep until it.
    pub fn sleep_until_next(&mut self) {
        self.deadline += self.period;
        let now = Instant::now();
        if self.deadline > now {
            std::thread::sleep(self.deadline - now);
        }
    }

    /// Record the interval achieved since the previous `sync()`.
    pub fn sync(&mut self) {
        let now = Instant::now();
        let interval = now - self.last_sync;
        self.last_sync = now;

        self.stats.cycles += 1;
        self.stats.last = interval;
        if interval > self.stats.max {
            self.stats.max = interval;
        }
    }

    /// Maximum achieved interval since the last reset.
    pub fn max_interval(&self) -> Duration {
        self.stats.max
    }

    /// Timing statistics since the last reset.
    pub fn stats(&self) -> IntervalStats {
        self.stats
    }

    /// Clear the statistics. The deadline chain is left untouched.
    pub fn reset(&mut self) {
        self.stats = IntervalStats::default();
    }
}
