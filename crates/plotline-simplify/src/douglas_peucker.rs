//! Douglas-Peucker refinement: the slow, high-quality second pass.
//!
//! For a range of points, the chord between its two endpoints stands in
//! for everything in between. If the interior point farthest from the
//! chord deviates by more than the tolerance, it is kept and both halves
//! are refined in turn; otherwise the whole interior is discarded.
//!
//! The divide-and-conquer is driven by an explicit stack of
//! `(start, end)` index ranges instead of native recursion. A series
//! whose deviation grows monotonically splits off one point per step,
//! which would otherwise recurse O(n) frames deep.
//!
//! Points with a non-finite coordinate cannot be drawn and split the
//! line into separate runs. They and the run boundaries next to them are
//! kept up front; refinement then only ever measures against chords with
//! finite endpoints.

use crate::segment::segment_distance_squared;
use crate::tolerance::Tolerance;
use crate::types::{KeepMask, Point};

/// Compute the Douglas-Peucker keep mask for projected `points`.
///
/// The first and last indices are always kept, as is every non-finite
/// point and its immediate neighbours. An empty input yields an empty
/// mask.
#[must_use = "returns the keep mask"]
pub fn douglas_peucker(points: &[Point], tolerance: Tolerance) -> KeepMask {
    refine(points, tolerance).mask
}

/// Keep mask plus bookkeeping from one refinement run.
pub(crate) struct Refinement {
    pub mask: KeepMask,
    /// Largest number of pending ranges held on the stack at once.
    pub max_stack_depth: usize,
}

pub(crate) fn refine(points: &[Point], tolerance: Tolerance) -> Refinement {
    let mut mask = KeepMask::discard_all(points.len());
    let Some(last) = points.len().checked_sub(1) else {
        return Refinement {
            mask,
            max_stack_depth: 0,
        };
    };

    mask.keep(0);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut run_start = 0;
    for i in 1..=last {
        if i == last || is_run_boundary(points, i) {
            mask.keep(i);
            if i - run_start > 1 {
                stack.push((run_start, i));
            }
            run_start = i;
        }
    }
    let mut max_stack_depth = stack.len();

    while let Some((start, end)) = stack.pop() {
        let Some((index, deviation)) = farthest_interior(points, start, end) else {
            continue;
        };
        if !tolerance.is_exceeded_by(deviation) {
            continue;
        }

        mask.keep(index);
        if index - start > 1 {
            stack.push((start, index));
        }
        if end - index > 1 {
            stack.push((index, end));
        }
        max_stack_depth = max_stack_depth.max(stack.len());
    }

    Refinement {
        mask,
        max_stack_depth,
    }
}

/// Whether index `i` is non-finite or borders a non-finite point.
fn is_run_boundary(points: &[Point], i: usize) -> bool {
    let not_finite = |j: usize| points.get(j).is_some_and(|p| !p.is_finite());
    not_finite(i) || not_finite(i + 1) || i.checked_sub(1).is_some_and(not_finite)
}

/// The interior index of `start..=end` farthest from the chord, with its
/// squared distance.
///
/// Ties go to the earliest index. A NaN distance ranks as infinite so
/// that it is always split off.
/// Returns `None` when the range has no interior.
fn farthest_interior(points: &[Point], start: usize, end: usize) -> Option<(usize, f64)> {
    let a = *points.get(start)?;
    let b = *points.get(end)?;
    let interior = points.get(start + 1..end)?;

    let mut farthest: Option<(usize, f64)> = None;
    for (offset, &p) in interior.iter().enumerate() {
        let d = segment_distance_squared(a, b, p);
        let d = if d.is_nan() { f64::INFINITY } else { d };
        if farthest.is_none_or(|(_, max)| d > max) {
            farthest = Some((start + 1 + offset, d));
        }
    }
    farthest
}
