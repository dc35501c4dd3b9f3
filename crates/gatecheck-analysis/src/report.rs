//! Results of a full analysis run
//!
//! A [`Report`] only holds values; rendering it as text or JSON is up to the
//! caller. It contains no timestamps or other run-dependent data, so the
//! same input and configuration always produce an identical report.

use serde::Serialize;

use crate::{
    cleaning::CleaningSummary,
    config::AnalysisConfig,
    dataset::{GroupCounts, RetentionMetric},
    engagement::EngagementAnalysis,
    impact::ImpactEstimate,
    integrity::SrmCheck,
    power::PowerOutcome,
    retention::RetentionAnalysis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Group sizes as loaded.
    pub loaded: GroupCounts,
    /// Group sizes after outlier removal.
    pub analyzed: GroupCounts,
}

/// Whether to roll out the treatment, judged on the decision metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    #[display("deploy the treatment")]
    Deploy,
    #[display("do not deploy the treatment")]
    DoNotDeploy,
    #[display("inconclusive, keep the control")]
    Inconclusive,
}

impl Recommendation {
    /// Decides from the bootstrap probabilities of one retention analysis.
    ///
    /// ```
    /// # use gatecheck_analysis::report::Recommendation;
    /// assert_eq!(Recommendation::decide(0.99, 0.01, 0.95), Recommendation::DoNotDeploy);
    /// assert_eq!(Recommendation::decide(0.02, 0.97, 0.95), Recommendation::Deploy);
    /// assert_eq!(Recommendation::decide(0.60, 0.40, 0.95), Recommendation::Inconclusive);
    /// ```
    #[must_use]
    pub fn decide(prob_worse: f64, prob_better: f64, confidence: f64) -> Self {
        if prob_worse > confidence {
            Self::DoNotDeploy
        } else if prob_better > confidence {
            Self::Deploy
        } else {
            Self::Inconclusive
        }
    }
}

/// Condition that limits how far the results can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caveat {
    #[display(
        "sample ratio mismatch (p = {p_value:.4} < {threshold}): group assignment may be biased"
    )]
    SampleRatioMismatch { p_value: f64, threshold: f64 },
    #[display(
        "insufficient power: {required_per_group} users per group needed, smallest group has {actual_per_group}"
    )]
    InsufficientPower {
        required_per_group: u64,
        actual_per_group: u64,
    },
    #[display(
        "power not computed: baseline rate {baseline} leaves no room for a change of {mde}"
    )]
    PowerNotComputable { baseline: f64, mde: f64 },
    #[display("impact estimate is a point estimate and ignores the uncertainty of the retention delta")]
    ImpactIgnoresUncertainty,
}

impl Caveat {
    /// Caveats implied by the stage results, in a fixed order.
    #[must_use]
    pub fn collect(srm: &SrmCheck, power: &PowerOutcome) -> Vec<Self> {
        let mut caveats = vec![];
        if srm.mismatch {
            caveats.push(Self::SampleRatioMismatch {
                p_value: srm.result.p_value,
                threshold: srm.threshold,
            });
        }
        match *power {
            PowerOutcome::Computed(analysis) if !analysis.sufficient => {
                caveats.push(Self::InsufficientPower {
                    required_per_group: analysis.required_per_group,
                    actual_per_group: analysis.actual_per_group,
                });
            }
            PowerOutcome::Computed(_) => {}
            PowerOutcome::NotComputable { baseline, mde, .. } => {
                caveats.push(Self::PowerNotComputable { baseline, mde });
            }
        }
        caveats.push(Self::ImpactIgnoresUncertainty);
        caveats
    }
}

/// Everything one analysis run found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Configuration the run used, after flag overrides.
    pub config: AnalysisConfig,
    pub dataset: DatasetSummary,
    /// Run on the data as loaded.
    pub srm: SrmCheck,
    pub cleaning: CleaningSummary,
    /// One entry per metric, 1-day first.
    pub retention: Vec<RetentionAnalysis>,
    pub engagement: EngagementAnalysis,
    pub power: PowerOutcome,
    pub impact: ImpactEstimate,
    /// In the order of [`Caveat::collect`].
    pub caveats: Vec<Caveat>,
    pub recommendation: Recommendation,
}

impl Report {
    /// Retention analysis of `metric`.
    #[must_use]
    pub fn retention(&self, metric: RetentionMetric) -> Option<&RetentionAnalysis> {
        self.retention.iter().find(|r| r.metric == metric)
    }
}
