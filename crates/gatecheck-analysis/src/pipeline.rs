//! End-to-end analysis driver
//!
//! Runs the stages in order on a loaded dataset:
//!
//! ```text
//! Dataset ─> SRM check ─> outlier removal ─┬─> retention (1-day, 7-day)
//!                                          └─> engagement
//!                                                 ─> power ─> impact ─> Report
//! ```
//!
//! The SRM check runs on the data as loaded; every later stage sees the
//! cleaned data. Statistical warnings become report caveats, only unusable
//! input or parameters abort the run.

use gatecheck_stats::StatsError;

use crate::{
    cleaning,
    config::AnalysisConfig,
    dataset::{Dataset, DatasetError, RetentionMetric, Variant},
    engagement, impact, integrity, power,
    report::{Caveat, DatasetSummary, Recommendation, Report},
    retention,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AnalysisError {
    #[display("invalid dataset: {_0}")]
    Dataset(DatasetError),
    #[display("statistical computation failed: {_0}")]
    Stats(StatsError),
}

/// Runs every stage on `dataset` and assembles the report.
pub fn run(dataset: Dataset, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let loaded = dataset.counts();
    let srm = integrity::check_sample_ratio(loaded, config.srm_threshold)?;

    let (dataset, cleaning) = cleaning::remove_outliers(dataset, &config.outlier_rule)?;
    let analyzed = dataset.counts();

    let retention = RetentionMetric::ALL
        .into_iter()
        .map(|metric| retention::estimate_retention(&dataset, metric, &config.bootstrap))
        .collect::<Result<Vec<_>, _>>()?;
    let engagement = engagement::compare_engagement(&dataset, config.engagement_alpha)?;
    let power = power::analyze_power(&dataset, &config.power)?;

    let delta = dataset.retention_rate(Variant::Treatment, config.impact.metric)
        - dataset.retention_rate(Variant::Control, config.impact.metric);
    let impact = impact::estimate_impact(delta, &config.impact);

    let decision = retention
        .iter()
        .find(|r| r.metric == config.decision_metric)
        .map_or(Recommendation::Inconclusive, |r| {
            Recommendation::decide(r.prob_worse(), r.prob_better(), config.decision_confidence)
        });
    let caveats = Caveat::collect(&srm, &power);

    tracing::info!(
        recommendation = %decision,
        caveats = caveats.len(),
        "analysis finished"
    );

    Ok(Report {
        config: config.clone(),
        dataset: DatasetSummary { loaded, analyzed },
        srm,
        cleaning,
        retention,
        engagement,
        power,
        impact,
        caveats,
        recommendation: decision,
    })
}

#[cfg(test)]
mod tests {
    use gatecheck_stats::bootstrap::BootstrapConfig;

    use super::*;
    use crate::{
        cleaning::OutlierRule,
        dataset::tests::{gate_experiment, record},
        power::{PowerConfig, PowerOutcome},
        synthetic::{SyntheticConfig, generate},
    };

    fn fast_config() -> AnalysisConfig {
        AnalysisConfig {
            bootstrap: BootstrapConfig {
                iterations: 200,
                ..BootstrapConfig::default()
            },
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_gate_experiment_end_to_end() {
        let report = run(gate_experiment(), &fast_config()).unwrap();

        assert!(report.srm.mismatch);
        assert_eq!(report.cleaning.removed_user_ids, vec![0]);
        assert_eq!(report.dataset.loaded.control, 44_700);
        assert_eq!(report.dataset.analyzed.control, 44_699);
        assert_eq!(report.dataset.analyzed.treatment, 45_489);

        let day7 = report.retention(RetentionMetric::Day7).unwrap();
        assert!(day7.bootstrap.mean_difference < 0.0);
        assert!((day7.absolute_difference + 0.0082).abs() < 1e-4);
        assert!(day7.prob_worse() > 0.95);
        assert_eq!(report.retention.len(), 2);
        assert_eq!(report.retention[0].metric, RetentionMetric::Day1);

        assert_eq!(report.impact.retained_user_change.round(), -818.0);
        assert!((report.impact.monetary_impact + 409_000.0).abs() < 1_000.0);

        assert!(report.power.analysis().unwrap().sufficient);
        assert_eq!(report.recommendation, Recommendation::DoNotDeploy);
        assert!(matches!(
            report.caveats[0],
            Caveat::SampleRatioMismatch { .. }
        ));
        assert_eq!(
            report.caveats.last(),
            Some(&Caveat::ImpactIgnoresUncertainty)
        );
    }

    #[test]
    fn test_same_input_and_seed_give_identical_reports() {
        let config = SyntheticConfig {
            num_users: 3_000,
            ..SyntheticConfig::default()
        };
        let first = run(generate(&config).unwrap(), &fast_config()).unwrap();
        let second = run(generate(&config).unwrap(), &fast_config()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_stage_errors_abort() {
        let config = AnalysisConfig {
            outlier_rule: OutlierRule::Threshold { cutoff: 0 },
            ..fast_config()
        };
        assert_eq!(
            run(gate_experiment(), &config),
            Err(AnalysisError::Dataset(DatasetError::Empty))
        );

        let config = AnalysisConfig {
            power: PowerConfig {
                mde: 0.0,
                ..PowerConfig::default()
            },
            ..fast_config()
        };
        assert_eq!(
            run(gate_experiment(), &config),
            Err(AnalysisError::Stats(StatsError::ZeroEffect))
        );

        let config = AnalysisConfig {
            bootstrap: BootstrapConfig {
                iterations: 0,
                ..BootstrapConfig::default()
            },
            ..AnalysisConfig::default()
        };
        assert_eq!(
            run(gate_experiment(), &config),
            Err(AnalysisError::Stats(StatsError::NoIterations))
        );
    }

    #[test]
    fn test_balanced_identical_groups_are_inconclusive() {
        let records = (0..400)
            .map(|i| {
                let variant = if i % 2 == 0 {
                    Variant::Control
                } else {
                    Variant::Treatment
                };
                record(i, variant, (i / 2) % 80)
            })
            .collect();
        let report = run(Dataset::new(records).unwrap(), &fast_config()).unwrap();

        assert!(!report.srm.mismatch);
        assert_eq!(report.cleaning.removed_count(), 0);
        assert!(!report.engagement.significant);
        assert_eq!(report.recommendation, Recommendation::Inconclusive);
        assert!(!report.power.analysis().unwrap().sufficient);
        assert!(
            report
                .caveats
                .iter()
                .any(|c| matches!(c, Caveat::InsufficientPower { .. }))
        );
    }

    #[test]
    fn test_near_total_retention_still_reports() {
        // 7-day retention of about 99.6%, too close to 1 to size a 1 pp change
        let records = (0..2_000)
            .map(|i| {
                let variant = if i % 2 == 0 {
                    Variant::Control
                } else {
                    Variant::Treatment
                };
                let rounds = if i % 500 == 0 { 0 } else { 60 + i % 7 };
                record(i, variant, rounds)
            })
            .collect();
        let report = run(Dataset::new(records).unwrap(), &fast_config()).unwrap();

        assert!(matches!(
            report.power,
            PowerOutcome::NotComputable { baseline, .. } if baseline > 0.99
        ));
        assert!(
            report
                .caveats
                .iter()
                .any(|c| matches!(c, Caveat::PowerNotComputable { mde, .. } if *mde == 0.01))
        );
        assert_eq!(report.retention.len(), 2);
        assert!(report.retention(RetentionMetric::Day7).unwrap().control_rate > 0.99);
        assert_eq!(report.engagement.control.stats.count, 1_000);
        assert!(report.impact.retention_delta > 0.0);
    }
}
