use std::ops::Range;

use serde::Serialize;

use crate::percentiles;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides the data range into bins and counts the frequency of values
/// falling into each bin. Binning is percentile-based (P5-P95) so that heavy tails,
/// such as a handful of users with thousands of game rounds, do not flatten the
/// interesting part of the distribution; the tails are kept in dedicated bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// The bins comprising the histogram. May include underflow and overflow bins
    /// at the start and end to capture values outside the main range.
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram from unsorted values.
    ///
    /// # Arguments
    ///
    /// * `values` - The data points to create the histogram from. Will be sorted internally.
    /// * `num_bins` - The number of main bins (excluding underflow/overflow bins). At least 2.
    /// * `bin_width_unit` - If provided, aligns bin widths to multiples of this unit.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gatecheck_stats::histogram::Histogram;
    /// let values = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 10.0];
    /// let histogram = Histogram::new(values, 5, None);
    /// assert_eq!(histogram.total_count(), 10);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize, bin_width_unit: Option<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, num_bins, bin_width_unit)
    }

    /// Creates a histogram from pre-sorted values.
    ///
    /// Returns an empty histogram if there are no values or fewer than two bins
    /// are requested.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], num_bins: usize, bin_width_unit: Option<f64>) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let (Some(&hard_min), Some(&last)) = (sorted_values.first(), sorted_values.last()) else {
            return Self { bins: vec![] };
        };
        if num_bins < 2 {
            return Self { bins: vec![] };
        }
        let mut hard_max = last;

        // Main range covers the central 90% of the distribution
        let soft_min = percentiles::compute_percentile(sorted_values, 5.0);
        let soft_max = percentiles::compute_percentile(sorted_values, 95.0);

        let mut range = soft_max - soft_min;
        if range < f64::EPSILON {
            // All mass at a single value
            range = bin_width_unit.unwrap_or(1.0);
        }

        let mut bin_width = range / ((num_bins - 1) as f64);
        if let Some(unit) = bin_width_unit {
            bin_width = (bin_width / unit).ceil() * unit;
            range = bin_width * ((num_bins - 1) as f64);
        }

        let soft_max = soft_min + range;
        if hard_max < soft_max {
            hard_max = soft_max;
        }

        // First bin is centered at soft_min
        let first_bin_start = soft_min - 0.5 * bin_width;
        let last_bin_end = first_bin_start + bin_width * num_bins as f64;

        let has_underflow = hard_min < first_bin_start;
        let has_overflow = hard_max >= last_bin_end;

        let mut bins = vec![];
        if has_underflow {
            bins.push(HistogramBin {
                range: hard_min..first_bin_start,
                count: 0,
            });
        }
        for bin_idx in 0..num_bins {
            let bin_start = f64::max(first_bin_start + bin_idx as f64 * bin_width, hard_min);
            let mut bin_end = f64::min(
                first_bin_start + (bin_idx + 1) as f64 * bin_width,
                hard_max,
            );
            if !has_overflow && bin_idx == num_bins - 1 {
                bin_end = bin_end.next_up();
            }
            bins.push(HistogramBin {
                range: bin_start..bin_end,
                count: 0,
            });
        }
        if has_overflow {
            bins.push(HistogramBin {
                range: last_bin_end..hard_max.next_up(),
                count: 0,
            });
        }

        let offset = usize::from(has_underflow);
        let last_idx = bins.len() - 1;
        for &val in sorted_values {
            let position = (val - first_bin_start) / bin_width;
            let idx = if position < 0.0 {
                0
            } else {
                // Rounding at the upper edge may push a value one bin too far
                ((position.floor() as usize) + offset).min(last_idx)
            };
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Total number of values counted across all bins.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// The largest bin count, or zero for an empty histogram.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).max().unwrap_or(0)
    }
}
