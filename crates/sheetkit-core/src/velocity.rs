#![forbid(unsafe_code)]

//! Velocity tracking for fling detection.
//!
//! Samples are kept in a small ring buffer. Velocity is the displacement
//! between the newest sample and the oldest one still inside the horizon,
//! divided by the elapsed time between them.

use web_time::{Duration, Instant};

/// Ring buffer size for velocity samples.
const HISTORY_SIZE: usize = 20;

/// Only samples within this window of the newest one contribute.
pub const VELOCITY_HORIZON: Duration = Duration::from_millis(100);

/// If the newest sample is older than this at query time, the pointer has stopped.
pub const ASSUME_STOPPED: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Instant,
    position: f64,
}

/// 1D velocity tracker over absolute positions.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    samples: [Option<Sample>; HISTORY_SIZE],
    index: usize,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }

    /// Record a position at `time`.
    pub fn add(&mut self, time: Instant, position: f64) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(Sample { time, position });
    }

    /// Drop all samples.
    pub fn reset(&mut self) {
        self.samples = [None; HISTORY_SIZE];
        self.index = 0;
    }

    /// Velocity in units per second over the recent window.
    ///
    /// Returns 0.0 with fewer than two samples in the window or zero elapsed time.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        let Some(newest) = self.samples[self.index] else {
            return 0.0;
        };

        let mut oldest = newest;
        let mut cursor = self.index;
        for _ in 1..HISTORY_SIZE {
            cursor = if cursor == 0 {
                HISTORY_SIZE - 1
            } else {
                cursor - 1
            };
            let Some(sample) = self.samples[cursor] else {
                break;
            };
            if sample.time > newest.time
                || newest.time.duration_since(sample.time) > VELOCITY_HORIZON
            {
                break;
            }
            oldest = sample;
        }

        let dt = newest.time.duration_since(oldest.time).as_secs_f64();
        if dt <= 0.0 {
            return 0.0;
        }
        let v = (newest.position - oldest.position) / dt;
        if v.is_finite() { v } else { 0.0 }
    }

    /// Velocity as seen at `now`: zero when the pointer has rested longer than
    /// [`ASSUME_STOPPED`] since the newest sample.
    #[must_use]
    pub fn velocity_at(&self, now: Instant) -> f64 {
        match self.samples[self.index] {
            Some(newest)
                if now
                    .checked_duration_since(newest.time)
                    .is_some_and(|idle| idle > ASSUME_STOPPED) =>
            {
                0.0
            }
            Some(_) => self.velocity(),
            None => 0.0,
        }
    }
}
