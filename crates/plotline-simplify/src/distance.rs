//! Distance filter: the fast, coarse first pass.
//!
//! Walks the projected series once, keeping a point as soon as it has
//! moved more than the tolerance away from the last kept point (the
//! anchor). Near-duplicate runs collapse to their first sample, which
//! shrinks the input before the quadratic-worst-case Douglas-Peucker
//! refinement runs.
//!
//! O(n) time, O(1) state besides the mask.

use crate::tolerance::Tolerance;
use crate::types::{KeepMask, Point};

/// Compute the distance filter keep mask for projected `points`.
///
/// The first and last indices are always kept. The last index is forced
/// after the scan regardless of its distance to the anchor. An empty
/// input yields an empty mask.
///
/// A point that is not finite breaks the drawn line. It is kept, and so
/// are the samples on either side of it, which end and restart the
/// visible runs.
#[must_use = "returns the keep mask"]
pub fn distance_filter(points: &[Point], tolerance: Tolerance) -> KeepMask {
    let mut mask = KeepMask::discard_all(points.len());
    let Some(&first) = points.first() else {
        return mask;
    };

    mask.keep(0);
    let mut anchor = first;

    for (i, &p) in points.iter().enumerate().skip(1) {
        let ends_run = points.get(i + 1).is_some_and(|q| !q.is_finite());
        if ends_run || tolerance.is_exceeded_by(p.distance_squared(anchor)) {
            mask.keep(i);
            anchor = p;
        }
    }

    mask.keep(points.len() - 1);
    mask
}
