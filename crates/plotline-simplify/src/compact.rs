//! Compaction: apply a keep mask to a series.
//!
//! Both simplification passes decide in scaled coordinates but output
//! the original, unscaled samples. Compaction is the step that carries a
//! mask back to the real data.

use crate::types::{KeepMask, Timeseries};

/// Copy the samples whose mask entry is kept into a new series.
///
/// Relative order is preserved and values are copied untouched. The
/// output is allocated at its exact final size: kept entries are counted
/// before anything is copied.
///
/// `times`, `values`, and `mask` must have the same length; entries past
/// the shortest of the three are ignored.
#[must_use = "returns the compacted series"]
pub fn compact(times: &[f64], values: &[f32], mask: &KeepMask) -> Timeseries {
    debug_assert_eq!(times.len(), values.len(), "times/values misaligned");
    debug_assert_eq!(times.len(), mask.len(), "mask length does not match series");

    let count = mask.kept_count();
    let mut kept_times = Vec::with_capacity(count);
    let mut kept_values = Vec::with_capacity(count);

    for ((&t, &v), &keep) in times.iter().zip(values).zip(mask.as_slice()) {
        if keep {
            kept_times.push(t);
            kept_values.push(v);
        }
    }

    Timeseries::from_aligned(kept_times, kept_values)
}

/// [`compact`] for a whole [`Timeseries`].
#[must_use = "returns the compacted series"]
pub fn compact_series(series: &Timeseries, mask: &KeepMask) -> Timeseries {
    compact(series.times(), series.values(), mask)
}
