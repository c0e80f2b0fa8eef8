use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic wall-clock source.
///
/// All state-machine transitions are driven by elapsed time from this
/// trait, never by frame counts, so gameplay timing is independent of
/// display refresh rate.
pub trait Clock {
    type Timestamp: Copy + PartialOrd + std::fmt::Debug;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, since: Self::Timestamp) -> Duration;

    /// Elapsed seconds since a reference timestamp.
    fn elapsed_secs(&self, since: Self::Timestamp) -> f64 {
        self.elapsed(since).as_secs_f64()
    }
}

/// Frame-interval statistics gathered while the loop runs.
#[derive(Debug, Clone)]
pub struct LoopStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub effective_fps: f64,
}

/// Production clock: nanoseconds since construction, monotonic.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
    frame_times: Vec<Duration>,
    max_samples: usize,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Record one frame interval for diagnostics.
    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }

    pub fn loop_stats(&self) -> LoopStats {
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return LoopStats {
                average_frame_time_ns: 0.0,
                jitter_ns: 0.0,
                effective_fps: 0.0,
            };
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        LoopStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
}

/// Hand-advanced clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep a handle and
/// advance it while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns.set(self.now_ns.get() + d.as_nanos() as u64);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now_ns.get()
    }

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_time_across_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let t0 = clock.now();
        handle.advance_secs(1.5);
        assert_eq!(clock.elapsed(t0), Duration::from_millis(1500));
    }

    #[test]
    fn monotonic_clock_elapsed_is_non_negative() {
        let clock = MonotonicClock::new();
        let t0 = clock.now();
        assert!(clock.elapsed_secs(t0) >= 0.0);
    }

    #[test]
    fn loop_stats_empty_is_zeroed() {
        let clock = MonotonicClock::new();
        let stats = clock.loop_stats();
        assert_eq!(stats.effective_fps, 0.0);
    }
}
