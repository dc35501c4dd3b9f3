//! Statistical routines for analysing two-variant experiments.
//!
//! This crate provides the domain-free building blocks used by the experiment
//! analysis pipeline:
//!
//! - **Descriptive statistics**: Calculate mean, median, variance, standard deviation, etc.
//! - **Percentiles**: Compute and store percentile values for datasets
//! - **Histogram generation**: Create frequency distributions with percentile-based binning
//! - **Comprehensive statistics**: Combined descriptive statistics, percentiles, and histograms
//! - **Chi-square goodness of fit**: Compare observed category counts to expected ones
//! - **Rank-sum test**: Mann-Whitney U test for two independent samples
//! - **Bootstrap**: Seeded resampling of the difference in means between two samples
//! - **Power analysis**: Sample size and achieved power for two-proportion tests
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`histogram`]: Histogram construction for visualizing data distributions
//! - [`comprehensive`]: Comprehensive statistical analysis combining multiple measures
//! - [`test_result`]: The common result type produced by every hypothesis test
//! - [`chi_square`]: Chi-square goodness-of-fit test
//! - [`rank_sum`]: Mann-Whitney U (Wilcoxon rank-sum) test
//! - [`bootstrap`]: Deterministic bootstrap of the difference in means
//! - [`power`]: Two-proportion power analysis
//!
//! # Examples
//!
//! ## Checking a group split
//!
//! ```
//! use gatecheck_stats::chi_square;
//!
//! let result = chi_square::uniform_goodness_of_fit(&[500, 500]).unwrap();
//! assert_eq!(result.statistic, 0.0);
//! assert!(result.p_value > 0.05);
//! ```
//!
//! ## Bootstrapping a difference in rates
//!
//! ```
//! use gatecheck_stats::bootstrap::{BootstrapConfig, bootstrap_mean_difference};
//!
//! let control = [1.0, 1.0, 0.0, 1.0, 0.0, 1.0];
//! let treatment = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
//! let config = BootstrapConfig { iterations: 200, seed: 7, confidence_level: 0.95 };
//! let summary = bootstrap_mean_difference(&control, &treatment, &config).unwrap();
//! assert!(summary.mean_difference < 0.0);
//! ```
//!
//! ## Sizing an experiment
//!
//! ```
//! use gatecheck_stats::power;
//!
//! let n = power::required_sample_size(0.20, 0.01, 0.8, 0.05).unwrap();
//! assert!(n > 20_000 && n < 30_000);
//! ```

pub mod bootstrap;
pub mod chi_square;
pub mod comprehensive;
pub mod descriptive;
pub mod histogram;
pub mod percentiles;
pub mod power;
pub mod rank_sum;
pub mod test_result;

/// Errors produced by the statistical routines when their inputs are unusable.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum StatsError {
    #[display("{name} must lie strictly between 0 and 1, got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[display("minimum detectable effect must be non-zero")]
    ZeroEffect,
    #[display("{name} sample is empty")]
    EmptySample { name: &'static str },
    #[display("at least two categories are required, got {count}")]
    TooFewCategories { count: usize },
    #[display("observed has {observed} categories but expected has {expected}")]
    CategoryMismatch { observed: usize, expected: usize },
    #[display("expected frequency of category {index} must be positive, got {value}")]
    NonPositiveExpected { index: usize, value: f64 },
    #[display("bootstrap requires at least one iteration")]
    NoIterations,
}

/// Checks that `value` lies strictly between 0 and 1.
///
/// ```
/// use gatecheck_stats::{StatsError, check_probability};
///
/// assert_eq!(check_probability("alpha", 0.05), Ok(()));
/// assert_eq!(
///     check_probability("alpha", 1.0),
///     Err(StatsError::ProbabilityOutOfRange { name: "alpha", value: 1.0 })
/// );
/// ```
pub fn check_probability(name: &'static str, value: f64) -> Result<(), StatsError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(StatsError::ProbabilityOutOfRange { name, value })
    }
}
