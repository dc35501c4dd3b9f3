//! Pearson's chi-square goodness-of-fit test.
//!
//! Used to detect sample ratio mismatch: the observed number of users in each
//! variant is compared against the counts the allocation design promised.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{StatsError, test_result::TestResult};

/// Tests observed category counts against explicit expected frequencies.
///
/// The statistic is `Σ (o - e)² / e` with `k - 1` degrees of freedom. The
/// effect estimate is Cohen's `w = sqrt(χ² / N)`.
///
/// # Examples
///
/// ```
/// use gatecheck_stats::chi_square::goodness_of_fit;
///
/// let result = goodness_of_fit(&[44_700, 45_489], &[45_094.5, 45_094.5]).unwrap();
/// assert!((result.statistic - 6.9).abs() < 0.1);
/// assert!(result.p_value < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn goodness_of_fit(observed: &[u64], expected: &[f64]) -> Result<TestResult, StatsError> {
    if observed.len() != expected.len() {
        return Err(StatsError::CategoryMismatch {
            observed: observed.len(),
            expected: expected.len(),
        });
    }
    let categories = observed.len();
    if categories < 2 {
        return Err(StatsError::TooFewCategories { count: categories });
    }
    if let Some((index, &value)) = expected.iter().enumerate().find(|(_, e)| **e <= 0.0) {
        return Err(StatsError::NonPositiveExpected { index, value });
    }

    let statistic = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| (o as f64 - e).powi(2) / e)
        .sum::<f64>();
    let total = observed.iter().sum::<u64>() as f64;

    let distribution = ChiSquared::new((categories - 1) as f64)
        .map_err(|_| StatsError::TooFewCategories { count: categories })?;
    let p_value = distribution.sf(statistic);

    Ok(TestResult {
        statistic,
        p_value,
        effect_estimate: (statistic / total).sqrt(),
        confidence_interval: None,
    })
}

/// Tests observed counts against an equal split of their total.
///
/// ```
/// use gatecheck_stats::chi_square::uniform_goodness_of_fit;
///
/// let balanced = uniform_goodness_of_fit(&[45_000, 45_000]).unwrap();
/// assert!(balanced.p_value > 0.99);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn uniform_goodness_of_fit(observed: &[u64]) -> Result<TestResult, StatsError> {
    let total = observed.iter().sum::<u64>();
    if total == 0 {
        return Err(StatsError::EmptySample { name: "observed" });
    }
    let share = total as f64 / observed.len() as f64;
    goodness_of_fit(observed, &vec![share; observed.len()])
}
