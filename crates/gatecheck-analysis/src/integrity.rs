//! Sample ratio mismatch (SRM) check
//!
//! Users are meant to be split evenly between the variants. A group-size
//! imbalance larger than chance points at a broken assignment
//! or logging pipeline, which undermines every later comparison. The check
//! only warns: the analysis continues and the report carries a caveat.

use gatecheck_stats::{StatsError, chi_square, test_result::TestResult};
use serde::Serialize;

use crate::dataset::GroupCounts;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SrmCheck {
    pub counts: GroupCounts,
    /// Users expected in each group under a 50/50 split.
    pub expected_per_group: f64,
    pub result: TestResult,
    pub threshold: f64,
    /// `true` if the p-value fell below `threshold`.
    pub mismatch: bool,
}

/// Tests the observed group sizes against an even split.
#[expect(clippy::cast_precision_loss)]
pub fn check_sample_ratio(counts: GroupCounts, threshold: f64) -> Result<SrmCheck, StatsError> {
    let result = chi_square::uniform_goodness_of_fit(&[counts.control, counts.treatment])?;
    let mismatch = result.p_value < threshold;
    let check = SrmCheck {
        counts,
        expected_per_group: counts.total() as f64 / 2.0,
        result,
        threshold,
        mismatch,
    };

    if mismatch {
        tracing::warn!(
            control = counts.control,
            treatment = counts.treatment,
            chi_square = result.statistic,
            p_value = result.p_value,
            threshold,
            "sample ratio mismatch"
        );
    } else {
        tracing::info!(
            chi_square = result.statistic,
            p_value = result.p_value,
            "group sizes consistent with an even split"
        );
    }
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(control: u64, treatment: u64) -> GroupCounts {
        GroupCounts { control, treatment }
    }

    #[test]
    fn test_even_split_passes() {
        for n in [10, 1_000, 45_000] {
            let check = check_sample_ratio(counts(n, n), 0.01).unwrap();
            assert_eq!(check.result.statistic, 0.0);
            assert!(check.result.p_value > 0.05);
            assert!(!check.mismatch);
        }
    }

    #[test]
    fn test_gate_experiment_split_is_flagged() {
        let check = check_sample_ratio(counts(44_700, 45_489), 0.01).unwrap();
        assert_eq!(check.expected_per_group, 45_094.5);
        assert!((check.result.statistic - 6.902).abs() < 0.01);
        assert!(check.result.p_value < 0.01);
        assert!(check.mismatch);
    }

    #[test]
    fn test_threshold_decides_mismatch() {
        let lenient = check_sample_ratio(counts(44_700, 45_489), 0.001).unwrap();
        assert!(!lenient.mismatch);
        let strict = check_sample_ratio(counts(44_700, 45_489), 0.05).unwrap();
        assert!(strict.mismatch);
    }

    #[test]
    fn test_extreme_imbalance() {
        let check = check_sample_ratio(counts(100, 900), 0.01).unwrap();
        assert!(check.result.p_value < 1e-10);
        assert!(check.mismatch);
    }
}
