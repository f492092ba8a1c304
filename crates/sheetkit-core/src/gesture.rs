#![forbid(unsafe_code)]

//! Gesture session: scroll-vs-drag arbitration for one pointer interaction.
//!
//! A [`GestureSession`] is created on pointer-down and consumed on release or
//! cancel. It decides whether the interaction drags the sheet, is handed to an
//! inner scrollable region, or is ignored, and it shapes the drag into sheet
//! offsets with elastic overdrag.
//!
//! # State Machine
//!
//! ```text
//!              below threshold
//!             ┌──────────────┐
//!             ▼              │
//! begin ──▶ PreDrag ─────────┘
//!             │
//!             ├── horizontal lock ───────────▶ Aborted   (never drags)
//!             │
//!             ├── vertical, region keeps it ─▶ Yielded   (inner scroll wins)
//!             │
//!             └── vertical, sheet steals ────▶ Dragging ──▶ release decision
//! ```
//!
//! # Invariants
//!
//! 1. Axis lock is decided once per session and never changes afterwards.
//! 2. Once `Aborted` or `Yielded`, no further drag frames are produced.
//! 3. Drag frames never carry a negative offset; upward overdrag is reported
//!    as `over_up` in [0, 1].
//! 4. A downward overdrag never exceeds `height + max_overdrag_down`.
//!
//! # Failure Modes
//!
//! - Non-finite coordinates are treated as zero displacement.
//! - A zero or negative sheet height is treated as zero travel: every
//!   positive displacement is overdrag.

use web_time::{Duration, Instant};

use crate::geometry::{Point, axis_angle_deg, clamp01, finite_or, rubber_band};
use crate::snap::{SnapPointSet, progress_of};
use crate::velocity::VelocityTracker;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default pixel distance (per axis) before the axis is decided.
pub const DEFAULT_AXIS_LOCK_THRESHOLD: f64 = 6.0;

/// Default tolerance, in degrees from vertical, for a vertical lock.
pub const DEFAULT_VERTICAL_TOLERANCE_DEG: f64 = 40.0;

/// Default fling velocity (px/s, downward) that forces a dismissal.
pub const DEFAULT_FLING_VELOCITY: f64 = 900.0;

/// Thresholds and physics parameters for gesture classification.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `SHEETKIT_AXIS_LOCK_PX` | f64 | 6 | Movement before the axis is decided |
/// | `SHEETKIT_VERTICAL_TOLERANCE_DEG` | f64 | 40 | Degrees from vertical still counted as vertical |
/// | `SHEETKIT_FLING_VELOCITY` | f64 | 900 | Downward px/s that dismisses |
/// | `SHEETKIT_CLOSE_THRESHOLD_PX` | f64 | 120 | Minimum drag distance that dismisses |
/// | `SHEETKIT_CLOSE_THRESHOLD_RATIO` | f64 | 0.75 | Fraction of height that dismisses |
/// | `SHEETKIT_DOUBLE_TAP` | bool | false | Enable double-tap to expand |
/// | `SHEETKIT_DOUBLE_TAP_DELAY_MS` | u64 | 250 | Double-tap window |
/// | `SHEETKIT_WHEEL_COOLDOWN_MS` | u64 | 350 | Minimum gap between wheel steps |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GestureConfig {
    /// Both |dx| and |dy| must stay below this (px) for the axis to remain undecided.
    pub axis_lock_threshold: f64,
    /// Motion within this many degrees of vertical locks the Y axis.
    pub vertical_tolerance_deg: f64,
    /// Whether pushing up may steal a gesture from a region scrolled to its bottom.
    pub allow_push_up_steal: bool,
    /// Upward elastic travel (px) at full compression.
    pub max_overdrag_up: f64,
    /// Slope of the upward elastic curve near zero.
    pub overdrag_up_damping: f64,
    /// Downward elastic travel (px) beyond the sheet height.
    pub max_overdrag_down: f64,
    /// Slope of the downward elastic curve near zero.
    pub overdrag_down_damping: f64,
    /// Downward release velocity (px/s) above which the sheet closes.
    pub fling_velocity: f64,
    /// Minimum drag distance (px) that dismisses on release.
    pub close_threshold_px: f64,
    /// Fraction of the sheet height that dismisses on release.
    pub close_threshold_ratio: f64,
    /// Enable double-tap to expand.
    pub double_tap_enabled: bool,
    /// Maximum gap between the two presses of a double tap.
    pub double_tap_delay: Duration,
    /// Maximum distance (px) between the two presses of a double tap.
    pub double_tap_tolerance: f64,
    /// Minimum gap between two wheel-driven snap steps.
    pub wheel_cooldown: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            axis_lock_threshold: DEFAULT_AXIS_LOCK_THRESHOLD,
            vertical_tolerance_deg: DEFAULT_VERTICAL_TOLERANCE_DEG,
            allow_push_up_steal: false,
            max_overdrag_up: 60.0,
            overdrag_up_damping: 0.5,
            max_overdrag_down: 120.0,
            overdrag_down_damping: 0.5,
            fling_velocity: DEFAULT_FLING_VELOCITY,
            close_threshold_px: 120.0,
            close_threshold_ratio: 0.75,
            double_tap_enabled: false,
            double_tap_delay: Duration::from_millis(250),
            double_tap_tolerance: 14.0,
            wheel_cooldown: Duration::from_millis(350),
        }
    }
}

impl GestureConfig {
    /// Set the fling velocity threshold (px/s).
    #[must_use]
    pub fn with_fling_velocity(mut self, velocity: f64) -> Self {
        self.fling_velocity = velocity;
        self
    }

    /// Set the distance-based close thresholds.
    #[must_use]
    pub fn with_close_threshold(mut self, px: f64, ratio: f64) -> Self {
        self.close_threshold_px = px;
        self.close_threshold_ratio = ratio;
        self
    }

    /// Enable double-tap to expand with the given window and tolerance.
    #[must_use]
    pub fn with_double_tap(mut self, delay: Duration, tolerance_px: f64) -> Self {
        self.double_tap_enabled = true;
        self.double_tap_delay = delay;
        self.double_tap_tolerance = tolerance_px;
        self
    }

    /// Allow pushing up to steal a gesture from a region at its bottom edge.
    #[must_use]
    pub fn with_push_up_steal(mut self, allow: bool) -> Self {
        self.allow_push_up_steal = allow;
        self
    }

    /// Set the downward overdrag curve.
    #[must_use]
    pub fn with_overdrag_down(mut self, max_px: f64, damping: f64) -> Self {
        self.max_overdrag_down = max_px;
        self.overdrag_down_damping = damping;
        self
    }

    /// Set the upward overdrag curve.
    #[must_use]
    pub fn with_overdrag_up(mut self, max_px: f64, damping: f64) -> Self {
        self.max_overdrag_up = max_px;
        self.overdrag_up_damping = damping;
        self
    }

    /// Load config from `SHEETKIT_*` environment variables.
    ///
    /// Unparseable values are ignored; the result is [`validated`](Self::validated).
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_f64("SHEETKIT_AXIS_LOCK_PX") {
            config.axis_lock_threshold = v;
        }
        if let Some(v) = env_f64("SHEETKIT_VERTICAL_TOLERANCE_DEG") {
            config.vertical_tolerance_deg = v;
        }
        if let Some(v) = env_f64("SHEETKIT_FLING_VELOCITY") {
            config.fling_velocity = v;
        }
        if let Some(v) = env_f64("SHEETKIT_CLOSE_THRESHOLD_PX") {
            config.close_threshold_px = v;
        }
        if let Some(v) = env_f64("SHEETKIT_CLOSE_THRESHOLD_RATIO") {
            config.close_threshold_ratio = v;
        }
        if let Ok(val) = std::env::var("SHEETKIT_DOUBLE_TAP") {
            config.double_tap_enabled = val == "1" || val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = std::env::var("SHEETKIT_DOUBLE_TAP_DELAY_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.double_tap_delay = Duration::from_millis(ms);
        }
        if let Ok(val) = std::env::var("SHEETKIT_WHEEL_COOLDOWN_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.wheel_cooldown = Duration::from_millis(ms);
        }

        config.validated()
    }

    /// Clamp every field to a safe range.
    ///
    /// Non-finite values fall back to the defaults before clamping.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let d = Self::default();
        self.axis_lock_threshold =
            finite_or(self.axis_lock_threshold, d.axis_lock_threshold).clamp(1.0, 64.0);
        self.vertical_tolerance_deg =
            finite_or(self.vertical_tolerance_deg, d.vertical_tolerance_deg).clamp(1.0, 89.0);
        self.max_overdrag_up = finite_or(self.max_overdrag_up, d.max_overdrag_up).clamp(0.0, 1_000.0);
        self.overdrag_up_damping =
            finite_or(self.overdrag_up_damping, d.overdrag_up_damping).clamp(0.01, 4.0);
        self.max_overdrag_down =
            finite_or(self.max_overdrag_down, d.max_overdrag_down).clamp(0.0, 2_000.0);
        self.overdrag_down_damping =
            finite_or(self.overdrag_down_damping, d.overdrag_down_damping).clamp(0.01, 4.0);
        self.fling_velocity = finite_or(self.fling_velocity, d.fling_velocity).clamp(50.0, 20_000.0);
        self.close_threshold_px =
            finite_or(self.close_threshold_px, d.close_threshold_px).clamp(0.0, 10_000.0);
        self.close_threshold_ratio =
            finite_or(self.close_threshold_ratio, d.close_threshold_ratio).clamp(0.05, 1.0);
        self.double_tap_delay = self
            .double_tap_delay
            .clamp(Duration::from_millis(50), Duration::from_millis(1_000));
        self.double_tap_tolerance =
            finite_or(self.double_tap_tolerance, d.double_tap_tolerance).clamp(1.0, 100.0);
        self.wheel_cooldown = self.wheel_cooldown.min(Duration::from_millis(2_000));
        self
    }

    /// Distance (px) past which a release dismisses, for a given sheet height.
    #[must_use]
    pub fn close_distance(&self, height: f64) -> f64 {
        self.close_threshold_px
            .max(finite_or(height, 0.0).max(0.0) * self.close_threshold_ratio)
    }
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Scroll context
// ---------------------------------------------------------------------------

/// Slack (px) when comparing scroll offsets to the region's edges.
pub const SCROLL_EDGE_EPSILON: f64 = 1.0;

/// Geometry of an inner scrollable region, supplied by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollRegion {
    /// Current scroll offset from the top.
    pub scroll_top: f64,
    /// Total scrollable content height.
    pub scroll_height: f64,
    /// Visible viewport height.
    pub client_height: f64,
}

impl ScrollRegion {
    /// Create a region snapshot.
    #[must_use]
    pub const fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Content overflows the viewport.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.scroll_height - self.client_height > SCROLL_EDGE_EPSILON
    }

    /// Scrolled to (or above) the top edge.
    #[must_use]
    pub fn at_top(&self) -> bool {
        finite_or(self.scroll_top, 0.0) <= SCROLL_EDGE_EPSILON
    }

    /// Scrolled to (or past) the bottom edge.
    #[must_use]
    pub fn at_bottom(&self) -> bool {
        finite_or(self.scroll_top, 0.0) + self.client_height
            >= self.scroll_height - SCROLL_EDGE_EPSILON
    }
}

/// Scroll state captured at gesture origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollContext {
    /// The region as it was at pointer-down.
    pub region: ScrollRegion,
    /// The region was at its top edge at pointer-down.
    pub started_at_top: bool,
    /// The region was at its bottom edge at pointer-down.
    pub started_at_bottom: bool,
}

impl ScrollContext {
    /// Capture a context; `None` when the region does not actually scroll.
    #[must_use]
    pub fn capture(region: ScrollRegion) -> Option<Self> {
        region.is_scrollable().then(|| Self {
            region,
            started_at_top: region.at_top(),
            started_at_bottom: region.at_bottom(),
        })
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Axis decision for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisLock {
    /// Not decided yet.
    #[default]
    None,
    /// Horizontal: the session never drags.
    X,
    /// Vertical: the session drags or yields to inner scroll.
    Y,
}

/// Classification phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Axis not decided; no visual motion yet.
    PreDrag,
    /// The sheet follows the pointer.
    Dragging,
    /// An inner scrollable region keeps the gesture.
    Yielded,
    /// Locked to the horizontal axis; ignored.
    Aborted,
}

/// Sheet position produced by one drag sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragFrame {
    /// Downward displacement in px, always ≥ 0.
    pub offset: f64,
    /// Normalized upward overdrag in [0, 1].
    pub over_up: f64,
    /// Raw pointer displacement since the origin (px, positive downward).
    pub delta_y: f64,
}

/// Outcome of one move sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Still below the axis-lock threshold.
    Pending,
    /// Locked horizontal on this sample.
    Aborted,
    /// Handed to the inner scroll region on this sample.
    Yielded,
    /// Session already aborted or yielded earlier; nothing to do.
    Inactive,
    /// The drag started on this sample.
    Began(DragFrame),
    /// The drag continued.
    Moved(DragFrame),
}

/// What the engine should do when the pointer is released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseDecision {
    /// The session never became a drag; nothing moves.
    NotDragging,
    /// Dismiss the sheet.
    Dismiss {
        /// The dismissal came from release velocity, not position.
        fling: bool,
    },
    /// Settle on a snap index.
    Snap {
        /// Target index into the snap set.
        index: usize,
    },
}

/// Map a raw displacement onto sheet offset and upward compression.
///
/// - `raw < 0`: offset 0, `over_up = rubber_band(-raw) / max_overdrag_up`.
/// - `raw > height`: offset `height + rubber_band(raw - height)`.
/// - otherwise: offset `raw`.
#[must_use]
pub fn shape_overdrag(raw: f64, height: f64, config: &GestureConfig) -> (f64, f64) {
    let raw = finite_or(raw, 0.0);
    let height = finite_or(height, 0.0).max(0.0);
    if raw < 0.0 {
        let max = config.max_overdrag_up;
        let over_up = if max > 0.0 {
            clamp01(rubber_band(-raw, max, config.overdrag_up_damping) / max)
        } else {
            0.0
        };
        (0.0, over_up)
    } else if raw > height {
        let extra = rubber_band(
            raw - height,
            config.max_overdrag_down,
            config.overdrag_down_damping,
        );
        (height + extra, 0.0)
    } else {
        (raw, 0.0)
    }
}

/// One active pointer interaction.
#[derive(Debug, Clone)]
pub struct GestureSession {
    pointer_id: u32,
    origin: Point,
    last: Point,
    axis: AxisLock,
    phase: GesturePhase,
    scroll: Option<ScrollContext>,
    start_offset: f64,
    frame: DragFrame,
    velocity: VelocityTracker,
}

impl GestureSession {
    /// Start a session at `origin`.
    ///
    /// `region` is the scrollable region under the origin, if any; it only
    /// counts when it actually overflows. `start_offset` is the sheet offset at
    /// pointer-down, so drags continue from the current rest position.
    #[must_use]
    pub fn begin(
        pointer_id: u32,
        origin: Point,
        region: Option<ScrollRegion>,
        start_offset: f64,
        now: Instant,
    ) -> Self {
        let start_offset = finite_or(start_offset, 0.0).max(0.0);
        let mut velocity = VelocityTracker::new();
        velocity.add(now, origin.y);
        Self {
            pointer_id,
            origin,
            last: origin,
            axis: AxisLock::None,
            phase: GesturePhase::PreDrag,
            scroll: region.and_then(ScrollContext::capture),
            start_offset,
            frame: DragFrame {
                offset: start_offset,
                over_up: 0.0,
                delta_y: 0.0,
            },
            velocity,
        }
    }

    /// Pointer that owns this session.
    #[inline]
    #[must_use]
    pub const fn pointer_id(&self) -> u32 {
        self.pointer_id
    }

    /// Origin of the interaction.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Current axis decision.
    #[inline]
    #[must_use]
    pub const fn axis(&self) -> AxisLock {
        self.axis
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Whether the sheet is following the pointer.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.phase == GesturePhase::Dragging
    }

    /// Scroll context captured at the origin.
    #[inline]
    #[must_use]
    pub const fn scroll_context(&self) -> Option<ScrollContext> {
        self.scroll
    }

    /// The latest drag frame (the start offset before any drag).
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> DragFrame {
        self.frame
    }

    /// Feed a move sample.
    ///
    /// `live_region` is consulted only when a vertical lock happens inside a
    /// scrollable region, to see whether the region has since reached the edge
    /// that lets the sheet take over.
    pub fn update(
        &mut self,
        point: Point,
        now: Instant,
        height: f64,
        config: &GestureConfig,
        live_region: impl FnOnce() -> Option<ScrollRegion>,
    ) -> MoveOutcome {
        match self.phase {
            GesturePhase::Aborted | GesturePhase::Yielded => MoveOutcome::Inactive,
            GesturePhase::Dragging => {
                self.last = point;
                self.velocity.add(now, point.y);
                self.frame = self.compute_frame(point, height, config);
                MoveOutcome::Moved(self.frame)
            }
            GesturePhase::PreDrag => self.resolve_axis(point, now, height, config, live_region),
        }
    }

    /// Decide what the release means. Consumes the drag state.
    ///
    /// `point` is the release position when the host reports one; cancel
    /// paths pass `None` to release at the last known position.
    pub fn release(
        &mut self,
        point: Option<Point>,
        now: Instant,
        height: f64,
        snaps: &SnapPointSet,
        config: &GestureConfig,
    ) -> ReleaseDecision {
        if self.phase != GesturePhase::Dragging {
            return ReleaseDecision::NotDragging;
        }
        if let Some(point) = point {
            self.last = point;
            self.velocity.add(now, point.y);
            self.frame = self.compute_frame(point, height, config);
        }

        let velocity = self.velocity.velocity_at(now);
        if velocity > config.fling_velocity {
            return ReleaseDecision::Dismiss { fling: true };
        }
        if self.frame.offset > config.close_distance(height) {
            return ReleaseDecision::Dismiss { fling: false };
        }
        let index = snaps.nearest_index(progress_of(self.frame.offset, height));
        if snaps.is_closed_index(index) {
            ReleaseDecision::Dismiss { fling: false }
        } else {
            ReleaseDecision::Snap { index }
        }
    }

    /// Release velocity (px/s, positive downward) as of `now`.
    #[must_use]
    pub fn velocity_at(&self, now: Instant) -> f64 {
        self.velocity.velocity_at(now)
    }

    fn resolve_axis(
        &mut self,
        point: Point,
        now: Instant,
        height: f64,
        config: &GestureConfig,
        live_region: impl FnOnce() -> Option<ScrollRegion>,
    ) -> MoveOutcome {
        let (dx, dy) = self.origin.delta_to(point);
        let (dx, dy) = (finite_or(dx, 0.0), finite_or(dy, 0.0));
        if dx.abs() < config.axis_lock_threshold && dy.abs() < config.axis_lock_threshold {
            return MoveOutcome::Pending;
        }

        let from_vertical = 90.0 - axis_angle_deg(dx, dy);
        if from_vertical > config.vertical_tolerance_deg {
            self.axis = AxisLock::X;
            self.phase = GesturePhase::Aborted;
            return MoveOutcome::Aborted;
        }
        self.axis = AxisLock::Y;

        if let Some(ctx) = self.scroll {
            let live = live_region();
            let steal = if dy > 0.0 {
                ctx.started_at_top || live.is_some_and(|r| r.at_top())
            } else {
                config.allow_push_up_steal
                    && (ctx.started_at_bottom || live.is_some_and(|r| r.at_bottom()))
            };
            if !steal {
                self.phase = GesturePhase::Yielded;
                return MoveOutcome::Yielded;
            }
        }

        self.phase = GesturePhase::Dragging;
        self.last = point;
        self.velocity.add(now, point.y);
        self.frame = self.compute_frame(point, height, config);
        MoveOutcome::Began(self.frame)
    }

    fn compute_frame(&self, point: Point, height: f64, config: &GestureConfig) -> DragFrame {
        let delta_y = finite_or(point.y - self.origin.y, 0.0);
        let (offset, over_up) = shape_overdrag(self.start_offset + delta_y, height, config);
        DragFrame {
            offset,
            over_up,
            delta_y,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
