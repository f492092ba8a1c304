#![forbid(unsafe_code)]

//! Wheel-to-snap stepping.
//!
//! A wheel event moves the sheet one snap index only when the inner content
//! is already at its scroll boundary in the wheel's direction; otherwise the
//! content scrolls normally. Steps are throttled by a cooldown so a single
//! continuous trackpad swipe does not run through every snap point.
//!
//! Direction mapping (y grows downward, progress 0 = open):
//!
//! | Wheel | Content boundary | Step |
//! |-------|------------------|------|
//! | up (`delta_y < 0`) | at top | toward closed (index + 1) |
//! | down (`delta_y > 0`) | at bottom | toward open (index − 1) |

use web_time::Instant;

use crate::gesture::{GestureConfig, ScrollRegion};

/// Wheel deltas smaller than this (px) are ignored.
pub const WHEEL_DEAD_ZONE: f64 = 1.0;

/// Direction of a wheel-driven snap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelStep {
    /// One index toward fully open.
    TowardOpen,
    /// One index toward closed.
    TowardClosed,
}

/// Throttled wheel classifier.
#[derive(Debug, Clone, Default)]
pub struct WheelStepper {
    last_step: Option<Instant>,
}

impl WheelStepper {
    /// Create an idle stepper.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_step: None }
    }

    /// Classify one wheel event.
    ///
    /// `region` is the scrollable content under the cursor; `None` (or a
    /// region that does not overflow) counts as being at both boundaries.
    pub fn on_wheel(
        &mut self,
        delta_y: f64,
        region: Option<ScrollRegion>,
        now: Instant,
        config: &GestureConfig,
    ) -> Option<WheelStep> {
        if !delta_y.is_finite() || delta_y.abs() < WHEEL_DEAD_ZONE {
            return None;
        }
        let region = region.filter(ScrollRegion::is_scrollable);
        let step = if delta_y < 0.0 {
            region
                .is_none_or(|r| r.at_top())
                .then_some(WheelStep::TowardClosed)
        } else {
            region
                .is_none_or(|r| r.at_bottom())
                .then_some(WheelStep::TowardOpen)
        };
        let step = step?;

        if let Some(last) = self.last_step
            && now
                .checked_duration_since(last)
                .is_none_or(|gap| gap < config.wheel_cooldown)
        {
            return None;
        }
        self.last_step = Some(now);
        Some(step)
    }

    /// Forget the cooldown.
    pub fn reset(&mut self) {
        self.last_step = None;
    }
}
