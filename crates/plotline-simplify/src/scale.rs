//! Scales: map domain values (times, sample values) to screen coordinates.
//!
//! This module defines the [`Scale`] trait the pipeline uses to project a
//! series into screen space, and the [`ScaleKind`] enum for the common
//! viewport mappings that can be selected from a config at runtime.
//!
//! # Strategy pattern
//!
//! The pipeline only needs "a pure function from `f64` to `f64`". Any
//! closure qualifies through the blanket impl, so a renderer can pass
//! its own zoom-dependent mapping directly. [`ScaleKind`] covers the
//! mappings worth serializing.
//!
//! Scaled coordinates only decide which samples survive; they never
//! appear in the output series.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// A pure, deterministic mapping from a domain value to a screen coordinate.
///
/// Implementations must not depend on hidden state: the pipeline applies
/// the scale twice to the same samples (once per pass) and relies on
/// getting identical results.
pub trait Scale {
    /// Map `value` to a screen coordinate.
    fn apply(&self, value: f64) -> f64;
}

impl<F: Fn(f64) -> f64> Scale for F {
    fn apply(&self, value: f64) -> f64 {
        self(value)
    }
}

/// Selects a scale mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ScaleKind {
    /// Domain values are already screen coordinates.
    #[default]
    Identity,

    /// Affine map from `domain` onto `range`.
    ///
    /// `range` may be inverted (e.g. `[height, 0.0]` for a y axis that
    /// grows downwards).
    Linear {
        /// Domain bounds `[d0, d1]`.
        domain: [f64; 2],
        /// Screen bounds `[r0, r1]` that `d0` and `d1` map to.
        range: [f64; 2],
    },

    /// Base-10 logarithmic map from `domain` onto `range`.
    ///
    /// Non-positive inputs have no logarithm and map to NaN.
    Log {
        /// Domain bounds `[d0, d1]`, both strictly positive.
        domain: [f64; 2],
        /// Screen bounds `[r0, r1]` that `d0` and `d1` map to.
        range: [f64; 2],
    },
}

impl ScaleKind {
    /// Build a linear scale mapping `[min, max]` onto `[r0, r1]`.
    ///
    /// A degenerate extent (`min == max`, e.g. a constant series) is
    /// widened to `[min, min + 1]` so the scale stays invertible. A
    /// non-finite extent falls back to `[0, 1]`.
    #[must_use]
    pub fn fit_linear(min: f64, max: f64, r0: f64, r1: f64) -> Self {
        Self::Linear {
            domain: fit_domain(min, max),
            range: [r0, r1],
        }
    }

    /// Build a log scale mapping `[min, max]` onto `[r0, r1]`.
    ///
    /// Bounds are clamped to be strictly positive; a degenerate extent
    /// is widened to one decade.
    #[must_use]
    pub fn fit_log(min: f64, max: f64, r0: f64, r1: f64) -> Self {
        let lo = if min.is_finite() && min > 0.0 {
            min
        } else {
            1.0
        };
        let hi = if max.is_finite() && max > lo {
            max
        } else {
            lo * 10.0
        };
        Self::Log {
            domain: [lo, hi],
            range: [r0, r1],
        }
    }

    /// Check that the scale maps finite inputs to finite outputs.
    ///
    /// # Errors
    ///
    /// Returns a [`ScaleError`] for non-finite bounds, zero-width
    /// domains, and non-positive log domains.
    pub fn validate(&self) -> Result<(), ScaleError> {
        match *self {
            Self::Identity => Ok(()),
            Self::Linear { domain, range } => check_bounds(domain, range),
            Self::Log { domain, range } => {
                if domain[0] <= 0.0 || domain[1] <= 0.0 {
                    return Err(ScaleError::NonPositiveLogDomain);
                }
                check_bounds(domain, range)
            }
        }
    }
}

impl Scale for ScaleKind {
    fn apply(&self, value: f64) -> f64 {
        match *self {
            Self::Identity => value,
            Self::Linear {
                domain: [d0, d1],
                range: [r0, r1],
            } => interpolate((value - d0) / (d1 - d0), r0, r1),
            Self::Log {
                domain: [d0, d1],
                range: [r0, r1],
            } => {
                if value <= 0.0 {
                    return f64::NAN;
                }
                let (l0, l1) = (d0.log10(), d1.log10());
                interpolate((value.log10() - l0) / (l1 - l0), r0, r1)
            }
        }
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Linear { .. } => f.write_str("linear"),
            Self::Log { .. } => f.write_str("log"),
        }
    }
}

/// Reasons a [`ScaleKind`] cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScaleError {
    /// A domain or range bound is NaN or infinite.
    #[error("scale bounds must be finite")]
    NonFiniteBound,

    /// Both domain bounds are equal, so every input maps to NaN.
    #[error("scale domain must have non-zero width")]
    EmptyDomain,

    /// A log scale domain includes zero or negative values.
    #[error("log scale domain must be strictly positive")]
    NonPositiveLogDomain,
}

/// Project a series into screen space.
///
/// Produces one [`Point`] per sample. Values are widened from `f32` to
/// `f64` before scaling.
#[must_use]
pub fn project<X: Scale, Y: Scale>(
    times: &[f64],
    values: &[f32],
    time_scale: &X,
    value_scale: &Y,
) -> Vec<Point> {
    times
        .iter()
        .zip(values)
        .map(|(&t, &v)| Point::new(time_scale.apply(t), value_scale.apply(f64::from(v))))
        .collect()
}

fn interpolate(t: f64, r0: f64, r1: f64) -> f64 {
    t.mul_add(r1 - r0, r0)
}

fn fit_domain(min: f64, max: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if max > min { [min, max] } else { [min, min + 1.0] }
}

fn check_bounds(domain: [f64; 2], range: [f64; 2]) -> Result<(), ScaleError> {
    if domain.iter().chain(&range).any(|b| !b.is_finite()) {
        return Err(ScaleError::NonFiniteBound);
    }
    #[allow(clippy::float_cmp)]
    if domain[0] == domain[1] {
        return Err(ScaleError::EmptyDomain);
    }
    Ok(())
}
