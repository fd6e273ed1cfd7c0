//! Shared types for the plotline simplification pipeline.

use serde::{Deserialize, Serialize};

use crate::scale::ScaleKind;

/// A 2D point in scaled (screen-space) coordinates.
///
/// Points only exist transiently while the pipeline decides which
/// samples to keep; they are never written to the output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (scaled time).
    pub x: f64,
    /// Vertical position (scaled value).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A time-ordered series of samples.
///
/// Times use `f64` and values use `f32`: temporal precision matters more
/// than magnitude precision. Both vectors always have the same length.
/// Times are expected to be non-decreasing but this is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeseries")]
pub struct Timeseries {
    times: Vec<f64>,
    values: Vec<f32>,
}

/// Unvalidated serde form of [`Timeseries`].
#[derive(Deserialize)]
struct RawTimeseries {
    times: Vec<f64>,
    values: Vec<f32>,
}

impl TryFrom<RawTimeseries> for Timeseries {
    type Error = SimplifyError;

    fn try_from(raw: RawTimeseries) -> Result<Self, Self::Error> {
        Self::new(raw.times, raw.values)
    }
}

impl Timeseries {
    /// Create a series from index-aligned times and values.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::LengthMismatch`] if `times` and `values`
    /// have different lengths.
    pub fn new(times: Vec<f64>, values: Vec<f32>) -> Result<Self, SimplifyError> {
        if times.len() != values.len() {
            return Err(SimplifyError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        Ok(Self { times, values })
    }

    /// Build a series whose vectors are already known to be aligned.
    pub(crate) fn from_aligned(times: Vec<f64>, values: Vec<f32>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { times, values }
    }

    /// Sample times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Sample values, index-aligned with [`times`](Self::times).
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the series has no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The first `(time, value)` sample, if any.
    #[must_use]
    pub fn first(&self) -> Option<(f64, f32)> {
        Some((*self.times.first()?, *self.values.first()?))
    }

    /// The last `(time, value)` sample, if any.
    #[must_use]
    pub fn last(&self) -> Option<(f64, f32)> {
        Some((*self.times.last()?, *self.values.last()?))
    }

    /// Iterate over `(time, value)` samples in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Consume the series and return the underlying vectors.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<f32>) {
        (self.times, self.values)
    }
}

impl FromIterator<(f64, f32)> for Timeseries {
    fn from_iter<I: IntoIterator<Item = (f64, f32)>>(samples: I) -> Self {
        let (times, values) = samples.into_iter().unzip();
        Self { times, values }
    }
}

/// Per-index retention flags for one simplification stage.
///
/// The mask has exactly one entry per point of the sequence it judges.
/// Stages always mark the first and last index as kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepMask(Vec<bool>);

impl KeepMask {
    /// A mask of `len` entries with nothing kept yet.
    #[must_use]
    pub fn discard_all(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// Mark `index` as kept. Marking twice is harmless.
    pub fn keep(&mut self, index: usize) {
        if let Some(flag) = self.0.get_mut(index) {
            *flag = true;
        }
    }

    /// Whether `index` is kept. Out-of-range indices are not kept.
    #[must_use]
    pub fn is_kept(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Number of entries (kept or not).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the mask has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of kept entries.
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.0.iter().filter(|&&k| k).count()
    }

    /// Indices of kept entries, ascending.
    pub fn kept_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &k)| k)
            .map(|(i, _)| i)
    }

    /// The raw flags.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl From<Vec<bool>> for KeepMask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

/// Configuration for a config-driven pipeline run.
///
/// Callers with arbitrary scale closures use [`crate::simplify`]
/// directly; this struct covers the scales expressible as a
/// [`ScaleKind`], which makes it serializable (e.g. `--config-json`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Tolerance in scaled coordinate units. Detail smaller than this is
    /// considered visually insignificant. Values `<= 0` disable
    /// simplification.
    pub epsilon: f64,

    /// Maps sample times to horizontal screen coordinates.
    pub time_scale: ScaleKind,

    /// Maps sample values to vertical screen coordinates.
    pub value_scale: ScaleKind,
}

impl SimplifyConfig {
    /// Default tolerance: half a pixel.
    pub const DEFAULT_EPSILON: f64 = 0.5;

    /// Check the config for values the pipeline cannot interpret.
    ///
    /// # Errors
    ///
    /// Returns [`SimplifyError::InvalidConfig`] if `epsilon` is NaN or
    /// either scale is invalid (see [`ScaleKind::validate`]).
    pub fn validate(&self) -> Result<(), SimplifyError> {
        if self.epsilon.is_nan() {
            return Err(SimplifyError::InvalidConfig(
                "epsilon must not be NaN".to_string(),
            ));
        }
        self.time_scale
            .validate()
            .map_err(|e| SimplifyError::InvalidConfig(format!("time scale: {e}")))?;
        self.value_scale
            .validate()
            .map_err(|e| SimplifyError::InvalidConfig(format!("value scale: {e}")))?;
        Ok(())
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            time_scale: ScaleKind::default(),
            value_scale: ScaleKind::default(),
        }
    }
}

/// Result of running the pipeline with all intermediate stage outputs preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Distance filter mask over the input series.
    pub filter_mask: KeepMask,
    /// Input series after compaction with `filter_mask`.
    pub intermediate: Timeseries,
    /// Douglas-Peucker mask over `intermediate`.
    pub refine_mask: KeepMask,
    /// Final reduced series.
    pub output: Timeseries,
}

impl StagedResult {
    /// Number of samples in the original input.
    #[must_use]
    pub const fn input_len(&self) -> usize {
        self.filter_mask.len()
    }
}

/// Errors raised at the validation boundary.
///
/// The simplification core itself never fails; these cover malformed
/// input series and configs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum SimplifyError {
    /// `times` and `values` have different lengths.
    #[error("times and values differ in length ({times} times, {values} values)")]
    LengthMismatch {
        /// Number of times supplied.
        times: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// Configuration is invalid.
    #[error("invalid simplify configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance_squared() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_is_finite() {
        assert!(Point::new(1.0, -2.0).is_finite());
        assert!(!Point::new(f64::NAN, 0.0).is_finite());
        assert!(!Point::new(0.0, f64::INFINITY).is_finite());
    }

    // --- Timeseries tests ---

    #[test]
    fn timeseries_rejects_length_mismatch() {
        let err = Timeseries::new(vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert_eq!(err, SimplifyError::LengthMismatch { times: 2, values: 1 });
    }

    #[test]
    fn timeseries_endpoints() {
        let series = Timeseries::new(vec![0.0, 1.0, 2.0], vec![5.0, 6.0, 7.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first(), Some((0.0, 5.0)));
        assert_eq!(series.last(), Some((2.0, 7.0)));
    }

    #[test]
    fn timeseries_empty() {
        let series = Timeseries::default();
        assert!(series.is_empty());
        assert!(series.first().is_none());
        assert!(series.last().is_none());
    }

    #[test]
    fn timeseries_iter_pairs() {
        let series = Timeseries::new(vec![1.5, 2.5], vec![-1.0, 1.0]).unwrap();
        let pairs: Vec<_> = series.iter().collect();
        assert_eq!(pairs, vec![(1.5, -1.0), (2.5, 1.0)]);
    }

    #[test]
    fn timeseries_collects_from_pairs() {
        let series: Timeseries = (0..4_u8).map(|i| (f64::from(i), f32::from(i) * 2.0)).collect();
        assert_eq!(series.times(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(series.values(), &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn timeseries_json_preserves_every_bit() {
        // Shortest round-trip digits that a lossy float parser rounds
        // to a neighbouring f64.
        let series = Timeseries::new(
            vec![1.008_158_760_969_964_5, 0.1 + 0.2, 1.0 / 3.0, 5e-324],
            vec![0.1, 1.0 / 3.0, f32::MIN_POSITIVE, 16_777_216.0],
        )
        .unwrap();
        let json = serde_json::to_string(&series).unwrap();
        let back: Timeseries = serde_json::from_str(&json).unwrap();
        for (a, b) in back.iter().zip(series.iter()) {
            assert_eq!(a.0.to_bits(), b.0.to_bits());
            assert_eq!(a.1.to_bits(), b.1.to_bits());
        }
    }

    #[test]
    fn timeseries_deserialize_validates_lengths() {
        let result: Result<Timeseries, _> =
            serde_json::from_str(r#"{"times":[0.0,1.0],"values":[1.0]}"#);
        assert!(result.is_err());

        let series: Timeseries =
            serde_json::from_str(r#"{"times":[0.0,1.0],"values":[1.0,2.0]}"#).unwrap();
        assert_eq!(series.values(), &[1.0, 2.0]);
    }

    // --- KeepMask tests ---

    #[test]
    fn keep_mask_counts_and_indices() {
        let mut mask = KeepMask::discard_all(5);
        mask.keep(0);
        mask.keep(3);
        mask.keep(3);
        assert_eq!(mask.kept_count(), 2);
        assert_eq!(mask.kept_indices().collect::<Vec<_>>(), vec![0, 3]);
        assert!(mask.is_kept(3));
        assert!(!mask.is_kept(4));
    }

    #[test]
    fn keep_mask_out_of_range_is_ignored() {
        let mut mask = KeepMask::discard_all(2);
        mask.keep(7);
        assert_eq!(mask.kept_count(), 0);
        assert!(!mask.is_kept(7));
    }

    // --- SimplifyConfig tests ---

    #[test]
    fn config_defaults() {
        let config = SimplifyConfig::default();
        assert!((config.epsilon - SimplifyConfig::DEFAULT_EPSILON).abs() < f64::EPSILON);
        assert_eq!(config.time_scale, ScaleKind::Identity);
        assert_eq!(config.value_scale, ScaleKind::Identity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_nan_epsilon() {
        let config = SimplifyConfig {
            epsilon: f64::NAN,
            ..SimplifyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimplifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_allows_non_positive_epsilon() {
        let config = SimplifyConfig {
            epsilon: -1.0,
            ..SimplifyConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_reports_which_scale_is_invalid() {
        let config = SimplifyConfig {
            value_scale: ScaleKind::Log {
                domain: [0.0, 10.0],
                range: [0.0, 100.0],
            },
            ..SimplifyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("value scale"), "got {err}");
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: SimplifyConfig = serde_json::from_str(r#"{"epsilon":2.0}"#).unwrap();
        assert!((config.epsilon - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.time_scale, ScaleKind::Identity);
    }

    #[test]
    fn config_serde_round_trip() {
        let config = SimplifyConfig {
            epsilon: 1.25,
            time_scale: ScaleKind::Linear {
                domain: [0.0, 10.0],
                range: [0.0, 800.0],
            },
            value_scale: ScaleKind::Log {
                domain: [1.0, 1000.0],
                range: [600.0, 0.0],
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SimplifyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    // --- SimplifyError tests ---

    #[test]
    fn error_length_mismatch_display() {
        let err = SimplifyError::LengthMismatch { times: 3, values: 2 };
        assert_eq!(
            err.to_string(),
            "times and values differ in length (3 times, 2 values)",
        );
    }

    #[test]
    fn error_invalid_config_display() {
        let err = SimplifyError::InvalidConfig("epsilon must not be NaN".to_string());
        assert_eq!(
            err.to_string(),
            "invalid simplify configuration: epsilon must not be NaN",
        );
    }
}
