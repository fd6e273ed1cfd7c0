//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::simplify`] which runs both passes in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use plotline_simplify::{Pipeline, SimplifyError, Timeseries};
//! # fn run() -> Result<(), SimplifyError> {
//! let series = Timeseries::new(vec![0.0, 0.2, 0.4, 3.0, 4.0], vec![0.0, 0.0, 0.0, 10.0, 0.0])?;
//! let filtered = Pipeline::new(&series, 1.0, |t: f64| t, |v: f64| v).filter();
//! assert_eq!(filtered.intermediate().len(), 3);
//!
//! let staged = filtered.refine().into_result();
//! assert_eq!(staged.output.times(), &[0.0, 3.0, 4.0]);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline
//! state, carrying the intermediates computed so far.
//!
//! # Passes
//!
//! 1. [`Pending::filter`]: project the input, run the distance filter,
//!    and compact the *unscaled* input into the intermediate series.
//! 2. [`Filtered::refine`]: project the intermediate series again, run
//!    Douglas-Peucker, and compact the *intermediate* series.
//!
//! The second projection is recomputed rather than picked out of the
//! first: compaction renumbers the samples, and the refinement mask is
//! indexed against the intermediate series, never the original input.

use crate::compact::compact;
use crate::diagnostics::StageMetrics;
use crate::distance::distance_filter;
use crate::scale::{Scale, project};
use crate::tolerance::Tolerance;
use crate::types::{KeepMask, StagedResult, Timeseries};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The input is borrowed, not copied. Call [`filter`](Self::filter) to
/// advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .filter() to continue"]
pub struct Pending<'a, X, Y> {
    times: &'a [f64],
    values: &'a [f32],
    epsilon: f64,
    time_scale: X,
    value_scale: Y,
}

impl<'a, X: Scale, Y: Scale> Pending<'a, X, Y> {
    /// The input sample times.
    #[must_use]
    pub const fn times(&self) -> &'a [f64] {
        self.times
    }

    /// The input sample values.
    #[must_use]
    pub const fn values(&self) -> &'a [f32] {
        self.values
    }

    /// Run the distance filter and advance to the [`Filtered`] stage.
    pub fn filter(self) -> Filtered<X, Y> {
        let points = project(self.times, self.values, &self.time_scale, &self.value_scale);
        let non_finite_count = points.iter().filter(|p| !p.is_finite()).count();
        let filter_mask = distance_filter(&points, Tolerance::new(self.epsilon));
        drop(points);

        let intermediate = compact(self.times, self.values, &filter_mask);
        Filtered {
            epsilon: self.epsilon,
            time_scale: self.time_scale,
            value_scale: self.value_scale,
            filter_mask,
            intermediate,
            non_finite_count,
        }
    }
}

// ───────────────────────── Stage 1: Filtered ─────────────────────────

/// Pipeline state after the distance filter.
///
/// Call [`refine`](Self::refine) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .refine() to continue"]
pub struct Filtered<X, Y> {
    epsilon: f64,
    time_scale: X,
    value_scale: Y,
    filter_mask: KeepMask,
    intermediate: Timeseries,
    non_finite_count: usize,
}

impl<X: Scale, Y: Scale> Filtered<X, Y> {
    /// Distance filter mask over the input series.
    #[must_use]
    pub const fn filter_mask(&self) -> &KeepMask {
        &self.filter_mask
    }

    /// The input series reduced by the distance filter.
    #[must_use]
    pub const fn intermediate(&self) -> &Timeseries {
        &self.intermediate
    }

    /// Number of input samples whose projection was not finite.
    #[must_use]
    pub const fn non_finite_count(&self) -> usize {
        self.non_finite_count
    }

    /// Metrics describing the distance filter pass.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::DistanceFilter {
            epsilon: self.epsilon,
            points_before: self.filter_mask.len(),
            points_after: self.intermediate.len(),
            reduction_ratio: reduction_ratio(self.filter_mask.len(), self.intermediate.len()),
        }
    }

    /// Run Douglas-Peucker on the intermediate series and advance to the
    /// [`Refined`] stage.
    pub fn refine(self) -> Refined {
        let points = project(
            self.intermediate.times(),
            self.intermediate.values(),
            &self.time_scale,
            &self.value_scale,
        );
        let refinement = crate::douglas_peucker::refine(&points, Tolerance::new(self.epsilon));
        drop(points);

        let output = compact(
            self.intermediate.times(),
            self.intermediate.values(),
            &refinement.mask,
        );
        Refined {
            epsilon: self.epsilon,
            filter_mask: self.filter_mask,
            intermediate: self.intermediate,
            refine_mask: refinement.mask,
            output,
            max_stack_depth: refinement.max_stack_depth,
            non_finite_count: self.non_finite_count,
        }
    }
}

// ───────────────────────── Stage 2: Refined ──────────────────────────

/// Pipeline state after Douglas-Peucker refinement: the final stage.
///
/// Call [`into_result`](Self::into_result) for every intermediate, or
/// [`into_output`](Self::into_output) for just the reduced series.
#[must_use = "call .into_output() or .into_result() to extract the output"]
pub struct Refined {
    epsilon: f64,
    filter_mask: KeepMask,
    intermediate: Timeseries,
    refine_mask: KeepMask,
    output: Timeseries,
    max_stack_depth: usize,
    non_finite_count: usize,
}

impl Refined {
    /// Douglas-Peucker mask over the intermediate series.
    #[must_use]
    pub const fn refine_mask(&self) -> &KeepMask {
        &self.refine_mask
    }

    /// The final reduced series.
    #[must_use]
    pub const fn output(&self) -> &Timeseries {
        &self.output
    }

    /// Largest number of pending ranges the refinement held at once.
    #[must_use]
    pub const fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Number of input samples whose projection was not finite.
    #[must_use]
    pub const fn non_finite_count(&self) -> usize {
        self.non_finite_count
    }

    /// Metrics describing the refinement pass.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Refinement {
            epsilon: self.epsilon,
            points_before: self.intermediate.len(),
            points_after: self.output.len(),
            reduction_ratio: reduction_ratio(self.intermediate.len(), self.output.len()),
            max_stack_depth: self.max_stack_depth,
        }
    }

    /// Consume the pipeline and return only the reduced series.
    #[must_use]
    pub fn into_output(self) -> Timeseries {
        self.output
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            filter_mask: self.filter_mask,
            intermediate: self.intermediate,
            refine_mask: self.refine_mask,
            output: self.output,
        }
    }
}

// ─────────────────────────── PipelineStage ───────────────────────────

/// Total number of stages in the pipeline, including [`Pending`].
pub const STAGE_COUNT: usize = 3;

/// Trait implemented by every pipeline stage.
pub trait PipelineStage {
    /// Human-readable name of this stage (e.g. `"distance filter"`).
    const NAME: &'static str;

    /// Zero-based index of this stage (`0` for [`Pending`]).
    const INDEX: usize;

    /// Stage-specific metrics for diagnostics.
    ///
    /// `None` for [`Pending`], which has not done any work yet.
    fn stage_metrics(&self) -> Option<StageMetrics>;
}

impl<X: Scale, Y: Scale> PipelineStage for Pending<'_, X, Y> {
    const NAME: &'static str = "source";
    const INDEX: usize = 0;

    fn stage_metrics(&self) -> Option<StageMetrics> {
        None
    }
}

impl<X: Scale, Y: Scale> PipelineStage for Filtered<X, Y> {
    const NAME: &'static str = "distance filter";
    const INDEX: usize = 1;

    fn stage_metrics(&self) -> Option<StageMetrics> {
        Some(self.metrics())
    }
}

impl PipelineStage for Refined {
    const NAME: &'static str = "refinement";
    const INDEX: usize = 2;

    fn stage_metrics(&self) -> Option<StageMetrics> {
        Some(self.metrics())
    }
}

/// `1.0 - after / before`, or `0.0` for an empty input.
#[allow(clippy::cast_precision_loss)]
fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        1.0 - after as f64 / before as f64
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental two-pass simplification pipeline.
///
/// Created via [`Pipeline::new`] or [`Pipeline::from_slices`], which
/// store the input and scales without doing any processing:
///
/// ```rust
/// # use plotline_simplify::{Pipeline, ScaleKind, SimplifyError, Timeseries};
/// # fn run(series: &Timeseries) {
/// let x = ScaleKind::fit_linear(0.0, 60.0, 0.0, 800.0);
/// let output = Pipeline::new(series, 0.5, x, ScaleKind::Identity)
///     .filter()
///     .refine()
///     .into_output();
/// # }
/// ```
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip the filter or refine twice.
pub struct Pipeline;

impl Pipeline {
    /// Create a pipeline over a [`Timeseries`].
    #[allow(clippy::new_ret_no_self)]
    pub fn new<X: Scale, Y: Scale>(
        series: &Timeseries,
        epsilon: f64,
        time_scale: X,
        value_scale: Y,
    ) -> Pending<'_, X, Y> {
        Self::from_slices(series.times(), series.values(), epsilon, time_scale, value_scale)
    }

    /// Create a pipeline over raw, index-aligned slices.
    ///
    /// If the slices differ in length, the excess tail of the longer one
    /// is ignored.
    pub fn from_slices<'a, X: Scale, Y: Scale>(
        times: &'a [f64],
        values: &'a [f32],
        epsilon: f64,
        time_scale: X,
        value_scale: Y,
    ) -> Pending<'a, X, Y> {
        let len = times.len().min(values.len());
        Pending {
            times: &times[..len],
            values: &values[..len],
            epsilon,
            time_scale,
            value_scale,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::scale::ScaleKind;

    fn spike_series() -> Timeseries {
        Timeseries::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 0.0, 0.0, 10.0, 0.0],
        )
        .unwrap()
    }

    /// Near-duplicate samples before the spike that the distance
    /// filter collapses.
    fn clustered_series() -> Timeseries {
        Timeseries::new(
            vec![0.0, 0.2, 0.4, 3.0, 4.0],
            vec![0.0, 0.0, 0.0, 10.0, 0.0],
        )
        .unwrap()
    }

    fn identity(v: f64) -> f64 {
        v
    }

    #[test]
    fn pending_exposes_input() {
        let series = spike_series();
        let pending = Pipeline::new(&series, 1.0, identity, identity);
        assert_eq!(pending.times().len(), 5);
        assert_eq!(pending.values()[3], 10.0);
    }

    #[test]
    fn from_slices_truncates_to_common_length() {
        let pending = Pipeline::from_slices(&[0.0, 1.0, 2.0], &[5.0, 6.0], 1.0, identity, identity);
        assert_eq!(pending.times(), &[0.0, 1.0]);
        assert_eq!(pending.values(), &[5.0, 6.0]);
    }

    #[test]
    fn filtered_exposes_mask_and_intermediate() {
        let series = spike_series();
        let filtered = Pipeline::new(&series, 1.0, identity, identity).filter();
        // (2, 0) is 2 from the anchor, beyond epsilon; (1, 0) is exactly 1.
        assert_eq!(
            filtered.filter_mask().kept_indices().collect::<Vec<_>>(),
            vec![0, 2, 3, 4]
        );
        assert_eq!(filtered.intermediate().times(), &[0.0, 2.0, 3.0, 4.0]);
        assert_eq!(filtered.intermediate().values(), &[0.0, 0.0, 10.0, 0.0]);
        assert_eq!(filtered.non_finite_count(), 0);
    }

    #[test]
    fn refine_mask_is_indexed_against_intermediate() {
        let series = clustered_series();
        let refined = Pipeline::new(&series, 1.0, identity, identity)
            .filter()
            .refine();
        // The filter dropped input indices 1 and 2, so mask index 1 is
        // input index 3.
        assert_eq!(refined.refine_mask().len(), 3);
        assert_eq!(
            refined.refine_mask().kept_indices().collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(refined.output().times(), &[0.0, 3.0, 4.0]);
        assert_eq!(refined.output().values(), &[0.0, 10.0, 0.0]);
    }

    #[test]
    fn spike_keeps_its_shoulder() {
        // (2, 0) deviates about 1.9 from the chord (0, 0)-(3, 10).
        let series = spike_series();
        let output = Pipeline::new(&series, 1.0, identity, identity)
            .filter()
            .refine()
            .into_output();
        assert_eq!(output.times(), &[0.0, 2.0, 3.0, 4.0]);
        assert_eq!(output.values(), &[0.0, 0.0, 10.0, 0.0]);
    }

    #[test]
    fn second_pass_removes_what_the_first_kept() {
        // Evenly spaced collinear points survive the distance filter
        // (each step exceeds epsilon) but collapse under refinement.
        let times: Vec<f64> = (0..10).map(f64::from).collect();
        let values: Vec<f32> = (0..10u8).map(f32::from).collect();
        let series = Timeseries::new(times, values).unwrap();
        let staged = Pipeline::new(&series, 1.0, identity, identity)
            .filter()
            .refine()
            .into_result();
        assert_eq!(staged.intermediate.len(), 10);
        assert_eq!(staged.output.times(), &[0.0, 9.0]);
        assert_eq!(staged.input_len(), 10);
    }

    #[test]
    fn output_values_are_unscaled() {
        let series = spike_series();
        let output = Pipeline::new(&series, 1.0, |t: f64| t * 100.0, |v: f64| v * -3.0)
            .filter()
            .refine()
            .into_output();
        for (t, v) in output.iter() {
            assert!(series.iter().any(|(st, sv)| st == t && sv == v));
        }
    }

    #[test]
    fn scales_decide_what_survives() {
        // A 0.8 bump is below tolerance at unit value scale but well
        // above it once values are stretched 10x.
        let series = Timeseries::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 0.0, 0.8, 0.0, 0.0],
        )
        .unwrap();
        let flat = Pipeline::new(&series, 1.0, identity, identity)
            .filter()
            .refine()
            .into_output();
        let zoomed = Pipeline::new(&series, 1.0, identity, |v: f64| v * 10.0)
            .filter()
            .refine()
            .into_output();
        assert_eq!(flat.times(), &[0.0, 4.0]);
        assert_eq!(zoomed.times(), &[0.0, 2.0, 4.0]);
    }

    #[test]
    fn scale_kinds_drive_the_pipeline() {
        let series = spike_series();
        let x = ScaleKind::fit_linear(0.0, 4.0, 0.0, 4.0);
        let y = ScaleKind::fit_linear(0.0, 10.0, 0.0, 10.0);
        let output = Pipeline::new(&series, 1.0, x, y).filter().refine().into_output();
        assert_eq!(output.times(), &[0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn stage_metadata() {
        type Source<'a> = Pending<'a, fn(f64) -> f64, fn(f64) -> f64>;
        type Filter = Filtered<fn(f64) -> f64, fn(f64) -> f64>;
        assert_eq!(<Source<'static> as PipelineStage>::NAME, "source");
        assert_eq!(<Source<'static> as PipelineStage>::INDEX, 0);
        assert_eq!(<Filter as PipelineStage>::NAME, "distance filter");
        assert_eq!(<Refined as PipelineStage>::NAME, "refinement");
        assert_eq!(<Refined as PipelineStage>::INDEX, STAGE_COUNT - 1);
    }

    #[test]
    fn stage_metrics() {
        let series = spike_series();
        let pending = Pipeline::new(&series, 1.0, identity, identity);
        assert!(pending.stage_metrics().is_none());

        let filtered = pending.filter();
        match filtered.stage_metrics() {
            Some(StageMetrics::DistanceFilter {
                points_before,
                points_after,
                reduction_ratio,
                ..
            }) => {
                assert_eq!(points_before, 5);
                assert_eq!(points_after, 4);
                assert!((reduction_ratio - 0.2).abs() < 1e-12);
            }
            other => panic!("unexpected metrics: {other:?}"),
        }

        let refined = filtered.refine();
        assert!(matches!(
            refined.stage_metrics(),
            Some(StageMetrics::Refinement {
                points_before: 4,
                points_after: 4,
                ..
            })
        ));
    }

    #[test]
    fn reduction_ratio_of_empty_input_is_zero() {
        assert!((reduction_ratio(0, 0)).abs() < f64::EPSILON);
        assert!((reduction_ratio(4, 1) - 0.75).abs() < f64::EPSILON);
    }
}
