//! Tick-based timing, for measuring how long an image routine takes.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Ticks elapsed since the first timing call in this process. One tick is one nanosecond.
pub fn tick_count() -> u64 {
    let epoch = *EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

/// Ticks per second.
pub fn tick_frequency() -> f64 {
    1e9
}

/// Accumulating stopwatch. Each `start`/`stop` pair adds one lap.
#[derive(Debug, Clone, Default)]
pub struct TickMeter {
    started_at: Option<u64>,
    total: u64,
    laps: u32,
}

impl TickMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started_at = Some(tick_count());
    }

    pub fn stop(&mut self) {
        if let Some(t0) = self.started_at.take() {
            self.total += tick_count().saturating_sub(t0);
            self.laps += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.total)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.total as f64 / tick_frequency()
    }

    pub fn average_secs(&self) -> f64 {
        if self.laps == 0 {
            0.0
        } else {
            self.elapsed_secs() / self.laps as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_count_is_monotonic() {
        let a = tick_count();
        let b = tick_count();
        assert!(b >= a);
    }

    #[test]
    fn tick_meter_accumulates_laps() {
        let mut tm = TickMeter::new();
        for _ in 0..3 {
            tm.start();
            std::thread::sleep(Duration::from_millis(1));
            tm.stop();
        }
        assert_eq!(tm.laps(), 3);
        assert!(tm.elapsed() >= Duration::from_millis(3));
        assert!(tm.average_secs() > 0.0);

        tm.stop();
        assert_eq!(tm.laps(), 3);
        tm.reset();
        assert_eq!(tm.laps(), 0);
    }
}
