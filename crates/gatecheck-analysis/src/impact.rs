//! Translation of a retention change into users and money

use serde::{Deserialize, Serialize};

use crate::dataset::RetentionMetric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Number of users the change would be rolled out to.
    pub user_base: u64,
    /// Value of one retained user, in `currency`.
    pub value_per_retained_user: f64,
    /// Symbol prefixed to monetary amounts.
    pub currency: String,
    /// Metric whose delta drives the estimate.
    pub metric: RetentionMetric,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            user_base: 100_000,
            value_per_retained_user: 500.0,
            currency: "₹".to_owned(),
            metric: RetentionMetric::Day7,
        }
    }
}

/// Expected effect of rolling out the treatment.
///
/// Point estimate only: the uncertainty of `retention_delta` is not
/// propagated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactEstimate {
    /// Metric the delta was measured on.
    pub metric: RetentionMetric,
    /// `treatment_rate - control_rate`.
    pub retention_delta: f64,
    /// Copied from [`ImpactConfig`].
    pub user_base: u64,
    pub value_per_retained_user: f64,
    pub currency: String,
    /// Change in retained users; negative means users lost.
    pub retained_user_change: f64,
    /// `retained_user_change * value_per_retained_user`.
    pub monetary_impact: f64,
}

/// Estimates the impact of a retention delta on the configured user base.
///
/// ```
/// use gatecheck_analysis::impact::{ImpactConfig, estimate_impact};
///
/// let impact = estimate_impact(-0.0082, &ImpactConfig::default());
/// assert!((impact.retained_user_change + 820.0).abs() < 1e-9);
/// assert!((impact.monetary_impact + 410_000.0).abs() < 1e-6);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn estimate_impact(retention_delta: f64, config: &ImpactConfig) -> ImpactEstimate {
    let retained_user_change = retention_delta * config.user_base as f64;
    let monetary_impact = retained_user_change * config.value_per_retained_user;
    tracing::debug!(
        retention_delta,
        retained_user_change,
        monetary_impact,
        "impact estimated"
    );
    ImpactEstimate {
        metric: config.metric,
        retention_delta,
        user_base: config.user_base,
        value_per_retained_user: config.value_per_retained_user,
        currency: config.currency.clone(),
        retained_user_change,
        monetary_impact,
    }
}
