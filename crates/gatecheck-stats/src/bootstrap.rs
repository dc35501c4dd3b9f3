//! Bootstrap estimation of the difference in means between two samples.
//!
//! Each iteration draws a resample of the same size as each group, with
//! replacement, and records `mean(treatment) - mean(control)`. The resulting
//! distribution approximates the sampling distribution of the difference
//! without any parametric assumption.
//!
//! Resampling is driven by a [`Pcg64`] generator seeded from
//! [`BootstrapConfig::seed`], so the same inputs, seed and iteration count
//! always produce bit-identical summaries.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    StatsError, check_probability, percentiles,
    test_result::{ConfidenceInterval, TestResult},
};

/// Parameters of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of resampling iterations.
    pub iterations: usize,
    /// Seed of the resampling generator.
    pub seed: u64,
    /// Coverage of the percentile interval, e.g. `0.95` for P2.5-P97.5.
    pub confidence_level: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: 42,
            confidence_level: 0.95,
        }
    }
}

/// Summary of the bootstrap distribution of `mean(treatment) - mean(control)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapSummary {
    pub iterations: usize,
    /// Difference of the full-sample means.
    pub observed_difference: f64,
    /// Mean of the bootstrap differences.
    pub mean_difference: f64,
    /// Standard deviation of the bootstrap differences.
    pub std_error: f64,
    /// Percentile interval of the bootstrap differences.
    pub interval: ConfidenceInterval,
    /// Share of iterations in which the difference was negative.
    pub prob_negative: f64,
    /// Raw bootstrap differences in iteration order.
    #[serde(skip)]
    pub differences: Vec<f64>,
}

impl BootstrapSummary {
    /// Share of iterations in which the difference was positive.
    #[must_use]
    pub fn prob_positive(&self) -> f64 {
        self.share_where(|d| d > 0.0)
    }

    /// Converts the summary into the generic result type.
    ///
    /// The p-value is the two-sided bootstrap p-value
    /// `2 · min(P(diff ≤ 0), P(diff ≥ 0))`, capped at 1.
    #[must_use]
    pub fn to_test_result(&self) -> TestResult {
        let tail = self
            .share_where(|d| d <= 0.0)
            .min(self.share_where(|d| d >= 0.0));
        TestResult {
            statistic: self.mean_difference,
            p_value: (2.0 * tail).min(1.0),
            effect_estimate: self.mean_difference,
            confidence_interval: Some(self.interval),
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn share_where<F>(&self, mut predicate: F) -> f64
    where
        F: FnMut(f64) -> bool,
    {
        let count = self.differences.iter().filter(|d| predicate(**d)).count();
        count as f64 / self.differences.len().max(1) as f64
    }
}

/// Bootstraps the difference in means between `treatment` and `control`.
///
/// # Examples
///
/// ```
/// use gatecheck_stats::bootstrap::{BootstrapConfig, bootstrap_mean_difference};
///
/// let control = [0.0, 1.0, 1.0, 1.0];
/// let treatment = [0.0, 0.0, 1.0, 1.0];
/// let config = BootstrapConfig { iterations: 100, ..BootstrapConfig::default() };
///
/// let first = bootstrap_mean_difference(&control, &treatment, &config).unwrap();
/// let second = bootstrap_mean_difference(&control, &treatment, &config).unwrap();
/// assert_eq!(first, second);
/// assert_eq!(first.observed_difference, -0.25);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn bootstrap_mean_difference(
    control: &[f64],
    treatment: &[f64],
    config: &BootstrapConfig,
) -> Result<BootstrapSummary, StatsError> {
    if control.is_empty() {
        return Err(StatsError::EmptySample { name: "control" });
    }
    if treatment.is_empty() {
        return Err(StatsError::EmptySample { name: "treatment" });
    }
    if config.iterations == 0 {
        return Err(StatsError::NoIterations);
    }
    check_probability("confidence level", config.confidence_level)?;

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let differences = (0..config.iterations)
        .map(|_| {
            let control_mean = resample_mean(control, &mut rng);
            let treatment_mean = resample_mean(treatment, &mut rng);
            treatment_mean - control_mean
        })
        .collect::<Vec<_>>();

    let n = differences.len() as f64;
    let mean_difference = differences.iter().sum::<f64>() / n;
    let std_error = (differences
        .iter()
        .map(|d| (d - mean_difference).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    let prob_negative = differences.iter().filter(|d| **d < 0.0).count() as f64 / n;

    let mut sorted = differences.clone();
    sorted.sort_by(f64::total_cmp);
    let tail = (1.0 - config.confidence_level) / 2.0 * 100.0;
    let interval = ConfidenceInterval {
        level: config.confidence_level,
        lower: percentiles::compute_percentile(&sorted, tail),
        upper: percentiles::compute_percentile(&sorted, 100.0 - tail),
    };

    Ok(BootstrapSummary {
        iterations: config.iterations,
        observed_difference: mean(treatment) - mean(control),
        mean_difference,
        std_error,
        interval,
        prob_negative,
        differences,
    })
}

/// Mean of one resample drawn with replacement from `values`.
#[expect(clippy::cast_precision_loss)]
fn resample_mean<R>(values: &[f64], rng: &mut R) -> f64
where
    R: Rng,
{
    let n = values.len();
    let sum = (0..n)
        .map(|_| values[rng.random_range(0..n)])
        .sum::<f64>();
    sum / n as f64
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bernoulli_sample(successes: usize, total: usize) -> Vec<f64> {
        (0..total)
            .map(|i| if i < successes { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let control = bernoulli_sample(190, 1000);
        let treatment = bernoulli_sample(182, 1000);
        let config = BootstrapConfig {
            iterations: 300,
            seed: 2024,
            confidence_level: 0.95,
        };

        let first = bootstrap_mean_difference(&control, &treatment, &config).unwrap();
        let second = bootstrap_mean_difference(&control, &treatment, &config).unwrap();

        assert_eq!(first.mean_difference.to_bits(), second.mean_difference.to_bits());
        assert_eq!(first.std_error.to_bits(), second.std_error.to_bits());
        assert_eq!(first.interval, second.interval);
        assert_eq!(first.prob_negative.to_bits(), second.prob_negative.to_bits());
        assert_eq!(first.differences, second.differences);
    }

    #[test]
    fn test_different_seed_changes_draws() {
        let control = bernoulli_sample(190, 1000);
        let treatment = bernoulli_sample(182, 1000);
        let a = BootstrapConfig {
            iterations: 50,
            seed: 1,
            confidence_level: 0.95,
        };
        let b = BootstrapConfig { seed: 2, ..a };

        let first = bootstrap_mean_difference(&control, &treatment, &a).unwrap();
        let second = bootstrap_mean_difference(&control, &treatment, &b).unwrap();
        assert_ne!(first.differences, second.differences);
    }

    #[test]
    fn test_interval_brackets_mean() {
        let control = bernoulli_sample(300, 1000);
        let treatment = bernoulli_sample(250, 1000);
        let summary =
            bootstrap_mean_difference(&control, &treatment, &BootstrapConfig::default()).unwrap();

        assert!((summary.observed_difference + 0.05).abs() < 1e-12);
        assert!(summary.interval.lower < summary.mean_difference);
        assert!(summary.mean_difference < summary.interval.upper);
        assert!((summary.mean_difference - summary.observed_difference).abs() < 0.01);
        assert!(summary.prob_negative > 0.95);
        assert!(summary.to_test_result().p_value < 0.1);
    }

    #[test]
    fn test_constant_samples_have_zero_spread() {
        let summary = bootstrap_mean_difference(
            &[1.0; 20],
            &[1.0; 30],
            &BootstrapConfig {
                iterations: 10,
                ..BootstrapConfig::default()
            },
        )
        .unwrap();
        assert_eq!(summary.mean_difference, 0.0);
        assert_eq!(summary.std_error, 0.0);
        assert_eq!(summary.prob_negative, 0.0);
        assert_eq!(summary.prob_positive(), 0.0);
        assert_eq!(summary.to_test_result().p_value, 1.0);
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = BootstrapConfig {
            iterations: 0,
            ..BootstrapConfig::default()
        };
        assert_eq!(
            bootstrap_mean_difference(&[1.0], &[1.0], &config),
            Err(StatsError::NoIterations)
        );
        assert_eq!(
            bootstrap_mean_difference(&[], &[1.0], &BootstrapConfig::default()),
            Err(StatsError::EmptySample { name: "control" })
        );
    }
}
