//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! tolerance tuning and scale experimentation. Call
//! [`process_staged_with_diagnostics`] to collect them alongside the
//! pipeline results.
//!
//! Time is read through the [`Clock`] trait so the library itself stays
//! free of platform timing APIs; callers supply the clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{SimplifyConfig, SimplifyError, StagedResult, Timeseries};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// The current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Pass 1: projection, distance filter, and compaction.
    pub distance_filter: StageDiagnostics,
    /// Pass 2: re-projection, Douglas-Peucker, and compaction.
    pub refinement: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Distance filter metrics.
    DistanceFilter {
        /// Tolerance in scaled units.
        epsilon: f64,
        /// Points in the input series.
        points_before: usize,
        /// Points in the intermediate series.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Douglas-Peucker refinement metrics.
    Refinement {
        /// Tolerance in scaled units.
        epsilon: f64,
        /// Points in the intermediate series.
        points_before: usize,
        /// Points in the final output.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
        /// Largest number of pending ranges on the work stack.
        max_stack_depth: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Points in the input series.
    pub input_point_count: usize,
    /// Points surviving the distance filter.
    pub intermediate_point_count: usize,
    /// Points in the final output.
    pub final_point_count: usize,
    /// Input points whose projection was NaN or infinite.
    pub non_finite_point_count: usize,
}

/// Run the pipeline, collecting per-stage diagnostics.
///
/// # Errors
///
/// Returns [`SimplifyError::InvalidConfig`] if `config` fails
/// [`SimplifyConfig::validate`].
pub fn process_staged_with_diagnostics<C: Clock>(
    series: &Timeseries,
    config: &SimplifyConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), SimplifyError> {
    config.validate()?;
    let total_start = clock.now();

    let pending = Pipeline::new(series, config.epsilon, config.time_scale, config.value_scale);

    let start = clock.now();
    let filtered = pending.filter();
    let distance_filter = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: filtered.metrics(),
    };

    let start = clock.now();
    let refined = filtered.refine();
    let refinement = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: refined.metrics(),
    };

    let non_finite_point_count = refined.non_finite_count();
    let staged = refined.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        input_point_count: staged.input_len(),
        intermediate_point_count: staged.intermediate.len(),
        final_point_count: staged.output.len(),
        non_finite_point_count,
    };

    Ok((
        staged,
        PipelineDiagnostics {
            distance_filter,
            refinement,
            total_duration,
            summary,
        },
    ))
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Simplification Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Points: {} -> {} -> {}",
            self.summary.input_point_count,
            self.summary.intermediate_point_count,
            self.summary.final_point_count,
        ));
        if self.summary.non_finite_point_count > 0 {
            lines.push(format!(
                "Non-finite projections retained: {}",
                self.summary.non_finite_point_count,
            ));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Distance Filter", &self.distance_filter),
            ("Refinement", &self.refinement),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::DistanceFilter {
            epsilon,
            points_before,
            points_after,
            reduction_ratio,
        } => format!(
            "eps={epsilon:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
            reduction_ratio * 100.0,
        ),
        StageMetrics::Refinement {
            epsilon,
            points_before,
            points_after,
            reduction_ratio,
            max_stack_depth,
        } => format!(
            "eps={epsilon:.2} {points_before}->{points_after} pts ({:.1}% reduction) stack={max_stack_depth}",
            reduction_ratio * 100.0,
        ),
    }
}
