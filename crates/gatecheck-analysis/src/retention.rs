//! Bootstrap estimate of the retention difference between variants
//!
//! Retention outcomes are encoded as `1.0`/`0.0`, so the mean of a resample
//! is its retention rate and [`bootstrap_mean_difference`] yields the
//! distribution of `treatment_rate - control_rate` directly.

use gatecheck_stats::{
    StatsError,
    bootstrap::{BootstrapConfig, BootstrapSummary, bootstrap_mean_difference},
    histogram::Histogram,
    test_result::TestResult,
};
use serde::Serialize;

use crate::dataset::{Dataset, RetentionMetric, Variant};

const DIFFERENCE_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionAnalysis {
    pub metric: RetentionMetric,
    pub control_rate: f64,
    pub treatment_rate: f64,
    /// `treatment_rate - control_rate`.
    pub absolute_difference: f64,
    /// Absolute difference relative to the control rate.
    pub relative_difference: f64,
    pub bootstrap: BootstrapSummary,
    pub result: TestResult,
    /// Distribution of the bootstrap differences.
    pub histogram: Histogram,
}

impl RetentionAnalysis {
    /// Probability that treatment retains fewer users than control.
    #[must_use]
    pub fn prob_worse(&self) -> f64 {
        self.bootstrap.prob_negative
    }

    /// Probability that treatment retains more users than control.
    #[must_use]
    pub fn prob_better(&self) -> f64 {
        self.bootstrap.prob_positive()
    }
}

/// Seed for one metric's generator, derived from the configured base seed.
///
/// Each metric gets its own stream so adding or reordering metrics never
/// changes another metric's result.
#[must_use]
pub fn metric_seed(base_seed: u64, metric: RetentionMetric) -> u64 {
    let offset = match metric {
        RetentionMetric::Day1 => 1,
        RetentionMetric::Day7 => 7,
    };
    base_seed.wrapping_add(offset)
}

/// Bootstraps the retention difference for one metric.
pub fn estimate_retention(
    dataset: &Dataset,
    metric: RetentionMetric,
    config: &BootstrapConfig,
) -> Result<RetentionAnalysis, StatsError> {
    let control = dataset.retention_outcomes(Variant::Control, metric);
    let treatment = dataset.retention_outcomes(Variant::Treatment, metric);
    let config = BootstrapConfig {
        seed: metric_seed(config.seed, metric),
        ..*config
    };

    let bootstrap = bootstrap_mean_difference(&control, &treatment, &config)?;
    let control_rate = dataset.retention_rate(Variant::Control, metric);
    let treatment_rate = dataset.retention_rate(Variant::Treatment, metric);
    let absolute_difference = treatment_rate - control_rate;
    let relative_difference = if control_rate > 0.0 {
        absolute_difference / control_rate
    } else {
        0.0
    };

    tracing::info!(
        %metric,
        iterations = bootstrap.iterations,
        mean_difference = bootstrap.mean_difference,
        lower = bootstrap.interval.lower,
        upper = bootstrap.interval.upper,
        prob_negative = bootstrap.prob_negative,
        "retention bootstrap finished"
    );

    let histogram = Histogram::new(
        bootstrap.differences.iter().copied(),
        DIFFERENCE_HISTOGRAM_BINS,
        None,
    );
    Ok(RetentionAnalysis {
        metric,
        control_rate,
        treatment_rate,
        absolute_difference,
        relative_difference,
        result: bootstrap.to_test_result(),
        bootstrap,
        histogram,
    })
}
