#![forbid(unsafe_code)]

//! Double-tap detection.
//!
//! Observes raw press timestamps and positions independently of drag state.
//! Two presses within the configured delay and pixel tolerance form a double
//! tap; the second press is consumed so a third press starts a fresh pair.

use web_time::Instant;

use crate::geometry::Point;
use crate::gesture::GestureConfig;

/// Stateful double-tap detector.
#[derive(Debug, Clone, Default)]
pub struct DoubleTapDetector {
    last_press: Option<(Instant, Point)>,
}

impl DoubleTapDetector {
    /// Create an idle detector.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_press: None }
    }

    /// Record a press. Returns `true` when it completes a double tap.
    ///
    /// Always `false` while double-tap is disabled in `config`.
    pub fn press(&mut self, pos: Point, now: Instant, config: &GestureConfig) -> bool {
        if !config.double_tap_enabled {
            self.last_press = None;
            return false;
        }
        if let Some((time, prev)) = self.last_press
            && now
                .checked_duration_since(time)
                .is_some_and(|gap| gap <= config.double_tap_delay)
            && prev.distance(pos) <= config.double_tap_tolerance
        {
            self.last_press = None;
            return true;
        }
        self.last_press = Some((now, pos));
        false
    }

    /// Forget any pending first press.
    pub fn reset(&mut self) {
        self.last_press = None;
    }
}
