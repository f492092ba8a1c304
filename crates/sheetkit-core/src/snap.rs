#![forbid(unsafe_code)]

//! Normalized snap points.
//!
//! A snap point is a rest position expressed as progress along the sheet's
//! travel: `0.0` is fully revealed, `1.0` fully dismissed.
//!
//! # Invariants
//!
//! 1. The set is never empty.
//! 2. Values are finite, within [0.0, 1.0], strictly ascending.
//! 3. [`SnapPointSet::nearest_index`] returns a valid index for any input.
//!
//! # Failure Modes
//!
//! - Malformed input (NaN, out of range, duplicates) is normalized, never
//!   rejected. An input with no usable values falls back to `[0, 1]`.

use crate::geometry::{clamp01, finite_or, nearest_index};

/// Progress at or above which a snap point counts as "closed".
pub const CLOSED_THRESHOLD: f64 = 0.999;

/// Two values closer than this are treated as duplicates.
const DEDUP_EPSILON: f64 = 1e-9;

/// Ordered, deduplicated rest positions in [0, 1].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<f64>", into = "Vec<f64>"))]
pub struct SnapPointSet {
    points: Vec<f64>,
}

impl Default for SnapPointSet {
    fn default() -> Self {
        Self {
            points: vec![0.0, 1.0],
        }
    }
}

impl From<Vec<f64>> for SnapPointSet {
    fn from(points: Vec<f64>) -> Self {
        Self::new(&points)
    }
}

impl From<SnapPointSet> for Vec<f64> {
    fn from(set: SnapPointSet) -> Self {
        set.points
    }
}

impl SnapPointSet {
    /// Build a set from arbitrary input, normalizing it.
    #[must_use]
    pub fn new(points: &[f64]) -> Self {
        Self {
            points: normalize(points),
        }
    }

    /// The normalized values, ascending.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of snap points (always ≥ 1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest valid index.
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Clamp an index into range.
    #[inline]
    #[must_use]
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    /// Value at `index`, clamped into range.
    #[must_use]
    pub fn value(&self, index: usize) -> f64 {
        self.points
            .get(self.clamp_index(index))
            .copied()
            .unwrap_or(0.0)
    }

    /// Index of the value nearest to `progress`; ties go to the lower index.
    #[must_use]
    pub fn nearest_index(&self, progress: f64) -> usize {
        nearest_index(&self.points, clamp01(progress))
    }

    /// Whether the point at `index` means "dismissed".
    #[must_use]
    pub fn is_closed_index(&self, index: usize) -> bool {
        is_closed_value(self.value(index))
    }

    /// Indices of points that leave the sheet visible, ascending.
    ///
    /// When every point is a closed value the first index is returned alone,
    /// so callers always have somewhere to rest.
    #[must_use]
    pub fn open_indices(&self) -> Vec<usize> {
        let open: Vec<usize> = (0..self.points.len())
            .filter(|&i| !is_closed_value(self.points[i]))
            .collect();
        if open.is_empty() { vec![0] } else { open }
    }

    /// Replace the contents, normalizing the input.
    pub fn set(&mut self, points: &[f64]) {
        self.points = normalize(points);
    }
}

/// Clamp, drop non-finite values, sort ascending, deduplicate.
///
/// Returns `[0, 1]` when nothing usable remains.
#[must_use]
pub fn normalize(points: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = points
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .map(clamp01)
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup_by(|a, b| (*a - *b).abs() < DEDUP_EPSILON);
    if out.is_empty() {
        out = vec![0.0, 1.0];
    }
    out
}

/// `clamp01(offset_px / max(sheet_height_px, 1))`.
#[must_use]
pub fn progress_of(offset_px: f64, sheet_height_px: f64) -> f64 {
    let height = finite_or(sheet_height_px, 1.0).max(1.0);
    clamp01(offset_px / height)
}

/// Whether a progress value is effectively "fully closed".
#[inline]
#[must_use]
pub fn is_closed_value(progress: f64) -> bool {
    progress >= CLOSED_THRESHOLD
}
