//! plotline-simplify: Display-oriented timeseries simplification (sans-IO).
//!
//! Reduces a long series of `(time, value)` samples to the subset that is
//! visually indistinguishable once plotted, through:
//! project -> distance filter -> compact -> re-project ->
//! Douglas-Peucker -> compact.
//!
//! Every decision is made in *scaled* coordinates (pixels, usually),
//! supplied by two caller-provided [`Scale`]s, and a tolerance `epsilon`
//! in the same units. The output always consists of original, unscaled
//! input samples in their original order.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! slices and returns new vectors. Loading and saving series lives in
//! `plotline-bench`.

pub mod compact;
pub mod diagnostics;
pub mod distance;
pub mod douglas_peucker;
pub mod pipeline;
pub mod scale;
pub mod segment;
pub mod tolerance;
pub mod types;

pub use pipeline::Pipeline;
pub use scale::{Scale, ScaleError, ScaleKind};
pub use tolerance::Tolerance;
pub use types::{KeepMask, Point, SimplifyConfig, SimplifyError, StagedResult, Timeseries};

/// Simplify a series for display.
///
/// `times` and `values` are index-aligned; if their lengths differ the
/// excess tail of the longer slice is ignored. `epsilon` is the largest
/// deviation, in scaled units, that may be dropped. Non-positive
/// `epsilon` keeps every sample.
///
/// # Pipeline steps
///
/// 1. Project every sample through `time_scale` and `value_scale`
/// 2. Distance filter, keeping points that moved more than `epsilon`
/// 3. Compact the input into an intermediate series
/// 4. Project the intermediate series again
/// 5. Douglas-Peucker refinement
/// 6. Compact the intermediate series into the output
///
/// The first and last samples are always kept. Samples whose projection
/// is NaN or infinite are always kept.
#[must_use]
pub fn simplify<X: Scale, Y: Scale>(
    times: &[f64],
    values: &[f32],
    epsilon: f64,
    time_scale: X,
    value_scale: Y,
) -> Timeseries {
    Pipeline::from_slices(times, values, epsilon, time_scale, value_scale)
        .filter()
        .refine()
        .into_output()
}

/// Run the pipeline over a [`Timeseries`] using the scales in `config`.
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidConfig`] if `config` fails
/// [`SimplifyConfig::validate`].
pub fn process(series: &Timeseries, config: &SimplifyConfig) -> Result<Timeseries, SimplifyError> {
    config.validate()?;
    Ok(Pipeline::new(series, config.epsilon, config.time_scale, config.value_scale)
        .filter()
        .refine()
        .into_output())
}

/// Run the pipeline, preserving both masks and the intermediate series.
///
/// Useful for visualizing what each pass removed.
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidConfig`] if `config` fails
/// [`SimplifyConfig::validate`].
pub fn process_staged(
    series: &Timeseries,
    config: &SimplifyConfig,
) -> Result<StagedResult, SimplifyError> {
    config.validate()?;
    Ok(Pipeline::new(series, config.epsilon, config.time_scale, config.value_scale)
        .filter()
        .refine()
        .into_result())
}
