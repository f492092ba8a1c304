#![forbid(unsafe_code)]

//! Sheet position and derived render parameters.
//!
//! The engine stores only primitive position state. Everything the view layer
//! draws is computed by [`derive_style`] from that state, the lifecycle
//! phase, the stack slot and the config; nothing in [`SheetStyle`] is ever
//! mutated on its own.
//!
//! # Invariants
//!
//! 1. `offset ≥ 0` and finite; upward overdrag lives in `over_up ∈ [0, 1]`.
//! 2. `scale ∈ [1 − max_compression, 1]`, `backdrop_opacity ∈ [0, 1]`.
//! 3. A closed sheet derives `visible = false` and zero backdrop opacity.

use sheetkit_core::geometry::{clamp01, finite_or};
use sheetkit_core::gesture::DragFrame;
use sheetkit_core::snap::progress_of;

use crate::config::SheetConfig;
use crate::lifecycle::LifecyclePhase;
use crate::stacking::StackIndex;

/// Offsets closer than this are treated as equal.
const OFFSET_EPSILON: f64 = 0.5;

/// Primitive position state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionState {
    /// Downward displacement in px.
    pub offset: f64,
    /// Upward elastic compression in [0, 1].
    pub over_up: f64,
    /// A non-instantaneous transition is in flight.
    pub animating: bool,
}

impl PositionState {
    /// Progress in [0, 1] for a sheet of `height`.
    #[must_use]
    pub fn progress(&self, height: f64) -> f64 {
        progress_of(self.offset, height)
    }

    /// Move to `progress × height`.
    ///
    /// `animate` requests a view transition; it is dropped when the offset
    /// does not actually change. Returns whether a transition is now running.
    pub fn move_to(&mut self, progress: f64, height: f64, animate: bool) -> bool {
        let target = clamp01(progress) * sanitize_height(height);
        let moved = (target - self.offset).abs() > OFFSET_EPSILON;
        self.offset = target;
        self.over_up = 0.0;
        self.animating = animate && moved;
        self.animating
    }

    /// Follow a drag frame; drags never animate.
    pub fn apply_drag(&mut self, frame: DragFrame) {
        self.offset = finite_or(frame.offset, 0.0).max(0.0);
        self.over_up = clamp01(frame.over_up);
        self.animating = false;
    }

    /// Keep the relative position when the sheet height changes.
    pub fn reproject(&mut self, old_height: f64, new_height: f64) {
        let progress = self.progress(old_height);
        self.offset = progress * sanitize_height(new_height);
    }

    /// Back to the fully revealed rest state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Clamp a host-reported height to a finite, non-negative value.
#[must_use]
pub fn sanitize_height(height: f64) -> f64 {
    finite_or(height, 0.0).max(0.0)
}

/// Render parameters for the view layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SheetStyle {
    /// Vertical translation of the panel in px.
    pub translate_y_px: f64,
    /// Uniform scale of the panel (upward overdrag compression).
    pub scale: f64,
    /// Backdrop opacity in [0, 1].
    pub backdrop_opacity: f64,
    /// Stacking order.
    pub z_index: i32,
    /// The view should interpolate towards these values.
    pub transition: bool,
    /// The sheet should be rendered at all.
    pub visible: bool,
}

/// Derive render parameters. Pure.
#[must_use]
pub fn derive_style(
    position: &PositionState,
    phase: LifecyclePhase,
    height: f64,
    stack: Option<StackIndex>,
    config: &SheetConfig,
) -> SheetStyle {
    let visible = phase.is_visible();
    let compression = clamp01(position.over_up) * config.max_compression;
    let slot = stack.map_or(0, |s| i32::try_from(s.get()).unwrap_or(i32::MAX));
    SheetStyle {
        translate_y_px: finite_or(position.offset, 0.0).max(0.0),
        scale: (1.0 - compression).clamp(0.0, 1.0),
        backdrop_opacity: if visible {
            1.0 - position.progress(height)
        } else {
            0.0
        },
        z_index: config.base_z_index.saturating_add(slot),
        transition: position.animating && config.motion_enabled(),
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacking::StackingContext;

    #[test]
    fn move_to_sets_offset_from_progress() {
        let mut pos = PositionState::default();
        assert!(pos.move_to(0.5, 600.0, true));
        assert_eq!(pos.offset, 300.0);
        assert!(pos.animating);
        // Same target: nothing to animate.
        assert!(!pos.move_to(0.5, 600.0, true));
        assert!(!pos.move_to(0.0, 600.0, false));
        assert_eq!(pos.offset, 0.0);
    }

    #[test]
    fn reproject_keeps_relative_position() {
        let mut pos = PositionState::default();
        pos.move_to(0.25, 400.0, false);
        pos.reproject(400.0, 800.0);
        assert_eq!(pos.offset, 200.0);
        assert_eq!(pos.progress(800.0), 0.25);
    }

    #[test]
    fn drag_frames_are_sanitized() {
        let mut pos = PositionState {
            animating: true,
            ..PositionState::default()
        };
        pos.apply_drag(DragFrame {
            offset: f64::NAN,
            over_up: 3.0,
            delta_y: -10.0,
        });
        assert_eq!(pos.offset, 0.0);
        assert_eq!(pos.over_up, 1.0);
        assert!(!pos.animating);
    }

    #[test]
    fn style_of_open_sheet() {
        let config = SheetConfig::default();
        let ctx = StackingContext::new();
        let idx = ctx.acquire();
        let pos = PositionState {
            offset: 150.0,
            over_up: 0.0,
            animating: true,
        };
        let style = derive_style(&pos, LifecyclePhase::Open, 600.0, Some(idx), &config);
        assert_eq!(style.translate_y_px, 150.0);
        assert_eq!(style.scale, 1.0);
        assert_eq!(style.backdrop_opacity, 0.75);
        assert_eq!(style.z_index, 1001);
        assert!(style.transition);
        assert!(style.visible);
    }

    #[test]
    fn over_up_compresses() {
        let config = SheetConfig::default();
        let pos = PositionState {
            offset: 0.0,
            over_up: 1.0,
            animating: false,
        };
        let style = derive_style(&pos, LifecyclePhase::Open, 600.0, None, &config);
        assert!((style.scale - (1.0 - config.max_compression)).abs() < 1e-12);
        assert_eq!(style.backdrop_opacity, 1.0);
    }

    #[test]
    fn closed_and_reduced_motion() {
        let config = SheetConfig::default().with_reduced_motion(true);
        let pos = PositionState {
            offset: 0.0,
            over_up: 0.0,
            animating: true,
        };
        let style = derive_style(&pos, LifecyclePhase::Closed, 600.0, None, &config);
        assert!(!style.visible);
        assert_eq!(style.backdrop_opacity, 0.0);
        assert!(!style.transition);
    }
}
