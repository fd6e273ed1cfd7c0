//! Squared tolerance shared by both simplification passes.
//!
//! Every distance comparison in the pipeline is squared distance against
//! squared tolerance, so no square root is ever taken.
//!
//! # Degenerate inputs
//!
//! - `epsilon <= 0` or NaN: the squared tolerance is negative infinity,
//!   so every distance exceeds it and every point is kept.
//! - `epsilon == +inf`: no finite distance exceeds it.
//! - A non-finite squared distance (from NaN or infinite scaled
//!   coordinates) exceeds every tolerance. Points the scales cannot place
//!   on screen are therefore always retained rather than silently dropped.

/// Squared simplification tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    squared: f64,
}

impl Tolerance {
    /// Build the squared tolerance for `epsilon` (in scaled units).
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        let squared = if epsilon > 0.0 {
            epsilon * epsilon
        } else {
            f64::NEG_INFINITY
        };
        Self { squared }
    }

    /// The squared tolerance value.
    #[must_use]
    pub const fn squared(self) -> f64 {
        self.squared
    }

    /// Whether a squared distance is large enough to keep a point.
    #[must_use]
    pub fn is_exceeded_by(self, distance_squared: f64) -> bool {
        !distance_squared.is_finite() || distance_squared > self.squared
    }
}
