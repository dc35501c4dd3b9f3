//! Parameters of an analysis run
//!
//! Every field has a default, so a configuration file only needs to name what
//! it changes:
//!
//! ```json
//! {
//!   "srm_threshold": 0.05,
//!   "outlier_rule": { "kind": "percentile", "percentile": 99.9 },
//!   "bootstrap": { "iterations": 5000 }
//! }
//! ```

use gatecheck_stats::bootstrap::BootstrapConfig;
use serde::{Deserialize, Serialize};

use crate::{
    cleaning::OutlierRule,
    dataset::{RetentionMetric, VariantLabels},
    impact::ImpactConfig,
    power::PowerConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub labels: VariantLabels,
    /// SRM p-value below which the split is flagged.
    pub srm_threshold: f64,
    pub outlier_rule: OutlierRule,
    pub bootstrap: BootstrapConfig,
    /// Significance level of the engagement test.
    pub engagement_alpha: f64,
    pub power: PowerConfig,
    pub impact: ImpactConfig,
    /// Probability of being better (or worse) required for a firm recommendation.
    pub decision_confidence: f64,
    pub decision_metric: RetentionMetric,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            labels: VariantLabels::default(),
            srm_threshold: 0.01,
            outlier_rule: OutlierRule::default(),
            bootstrap: BootstrapConfig::default(),
            engagement_alpha: 0.05,
            power: PowerConfig::default(),
            impact: ImpactConfig::default(),
            decision_confidence: 0.95,
            decision_metric: RetentionMetric::Day7,
        }
    }
}
