#![forbid(unsafe_code)]

//! Geometric primitives and stateless physics helpers.
//!
//! # Invariants
//!
//! 1. [`clamp01`] always returns a value in [0.0, 1.0]; non-finite input maps to 0.0.
//! 2. [`axis_angle_deg`] returns an angle in [0.0, 90.0] measured from the
//!    horizontal axis.
//! 3. [`rubber_band`] is monotone in `distance`, returns 0.0 at 0.0, and never
//!    exceeds `max_travel`.
//! 4. [`nearest_index`] is total: it returns an index for every input,
//!    resolving ties toward the lower index.

/// Smallest damping factor accepted by [`rubber_band`].
pub const MIN_DAMPING: f64 = 0.01;

/// A point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement `(dx, dy)` from `self` to `other`.
    #[inline]
    #[must_use]
    pub fn delta_to(self, other: Point) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        let (dx, dy) = self.delta_to(other);
        dx.hypot(dy)
    }
}

/// Replace a non-finite value with `fallback`.
#[inline]
#[must_use]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Clamp to [0.0, 1.0]; NaN and infinities map to 0.0.
#[inline]
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    finite_or(value, 0.0).clamp(0.0, 1.0)
}

/// Angle of the motion vector `(dx, dy)` from the horizontal axis, in degrees.
///
/// Direction is ignored: the result is in [0, 90], where 0 is purely
/// horizontal and 90 purely vertical. A zero vector yields 0.
#[must_use]
pub fn axis_angle_deg(dx: f64, dy: f64) -> f64 {
    let ax = finite_or(dx, 0.0).abs();
    let ay = finite_or(dy, 0.0).abs();
    if ax == 0.0 && ay == 0.0 {
        return 0.0;
    }
    ay.atan2(ax).to_degrees()
}

/// Eased elastic resistance.
///
/// Maps an unbounded overdrag `distance` onto `[0, max_travel)`:
///
/// ```text
/// f(d) = max · (1 − 1 / (d · damping / max + 1))
/// ```
///
/// The slope at the origin equals `damping`, so small overdrags track the
/// finger at `damping` speed and large ones saturate at `max_travel`.
#[must_use]
pub fn rubber_band(distance: f64, max_travel: f64, damping: f64) -> f64 {
    let distance = finite_or(distance, 0.0);
    let max_travel = finite_or(max_travel, 0.0);
    if distance <= 0.0 || max_travel <= 0.0 {
        return 0.0;
    }
    let damping = finite_or(damping, MIN_DAMPING).max(MIN_DAMPING);
    let eased = max_travel * (1.0 - 1.0 / (distance * damping / max_travel + 1.0));
    eased.clamp(0.0, max_travel)
}

/// Index of the element nearest to `value`.
///
/// Scans ascending and keeps the first minimum, so ties resolve to the lower
/// index. Returns 0 for an empty slice.
#[must_use]
pub fn nearest_index(points: &[f64], value: f64) -> usize {
    let value = finite_or(value, 0.0);
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &p) in points.iter().enumerate() {
        let dist = (p - value).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
