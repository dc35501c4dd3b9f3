//! Engagement comparison with the Mann-Whitney U test
//!
//! Rounds played are heavily right-skewed, so the variants are compared by
//! rank rather than by mean. Per-variant summaries are kept alongside the
//! test so the report can show what the distributions look like.

use gatecheck_stats::{
    StatsError, comprehensive::ComprehensiveStats, rank_sum, test_result::TestResult,
};
use serde::Serialize;

use crate::dataset::{Dataset, Variant};

/// Percentiles reported for each variant's rounds played.
pub const ENGAGEMENT_PERCENTILES: &[f64] = &[10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];
const ENGAGEMENT_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementAnalysis {
    /// Rounds played by the control group.
    pub control: ComprehensiveStats,
    /// Rounds played by the treatment group.
    pub treatment: ComprehensiveStats,
    /// `statistic` is U for the control sample; `effect_estimate` is
    /// `U / (n_control * n_treatment)`.
    pub result: TestResult,
    pub alpha: f64,
    /// Whether `result.p_value` is below `alpha`.
    pub significant: bool,
}

fn summarize(dataset: &Dataset, variant: Variant) -> Result<ComprehensiveStats, StatsError> {
    ComprehensiveStats::new(
        dataset.rounds(variant),
        ENGAGEMENT_PERCENTILES,
        ENGAGEMENT_HISTOGRAM_BINS,
    )
    .ok_or(StatsError::EmptySample {
        name: variant.name(),
    })
}

/// Compares rounds played between the variants.
pub fn compare_engagement(dataset: &Dataset, alpha: f64) -> Result<EngagementAnalysis, StatsError> {
    let control = summarize(dataset, Variant::Control)?;
    let treatment = summarize(dataset, Variant::Treatment)?;
    let result = rank_sum::mann_whitney_u(
        &dataset.rounds(Variant::Control),
        &dataset.rounds(Variant::Treatment),
    )?;
    let significant = result.is_significant(alpha);

    tracing::info!(
        u = result.statistic,
        p_value = result.p_value,
        effect = result.effect_estimate,
        control_median = control.stats.median,
        treatment_median = treatment.stats.median,
        significant,
        "engagement test finished"
    );

    Ok(EngagementAnalysis {
        control,
        treatment,
        result,
        alpha,
        significant,
    })
}
