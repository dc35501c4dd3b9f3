//! Power analysis of the experiment
//!
//! Sizes a two-proportion test on one retention metric and checks whether the
//! smaller of the observed groups reaches that size.
//!
//! A configured baseline is a parameter and must be usable. A baseline taken
//! from the data is an observation: if it (or baseline plus the detectable
//! change) is not strictly between 0 and 1, the test cannot be sized and the
//! stage reports [`PowerOutcome::NotComputable`] instead of failing.

use gatecheck_stats::{StatsError, check_probability, power};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, RetentionMetric, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Minimum detectable absolute change in the retention rate.
    pub mde: f64,
    /// Desired probability of detecting a change of `mde`.
    pub power: f64,
    /// Two-sided significance level.
    pub alpha: f64,
    pub metric: RetentionMetric,
    /// Baseline rate; the observed control rate of `metric` when unset.
    pub baseline: Option<f64>,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            mde: 0.01,
            power: 0.8,
            alpha: 0.05,
            metric: RetentionMetric::Day7,
            baseline: None,
        }
    }
}

impl PowerConfig {
    /// Checks the configured parameters, without looking at any data.
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.mde == 0.0 {
            return Err(StatsError::ZeroEffect);
        }
        check_probability("power", self.power)?;
        check_probability("alpha", self.alpha)?;
        if let Some(baseline) = self.baseline {
            check_probability("baseline rate", baseline)?;
            check_probability("target rate", baseline + self.mde)?;
        }
        Ok(())
    }
}

/// Required and achieved sample size for one retention metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerAnalysis {
    pub metric: RetentionMetric,
    /// Retention rate the change is measured from.
    pub baseline: f64,
    /// Absolute change the test is sized for.
    pub mde: f64,
    /// Target power.
    pub power: f64,
    pub alpha: f64,
    /// Users needed in each group to reach `power`.
    pub required_per_group: u64,
    /// Size of the smaller variant.
    pub actual_per_group: u64,
    /// Power reached with `actual_per_group` users in each group.
    pub achieved_power: f64,
    /// Whether `actual_per_group` reaches `required_per_group`.
    pub sufficient: bool,
}

/// Outcome of the power stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PowerOutcome {
    /// The test was sized.
    Computed(PowerAnalysis),
    /// The observed baseline leaves no room for a change of `mde`.
    NotComputable {
        metric: RetentionMetric,
        baseline: f64,
        mde: f64,
    },
}

impl PowerOutcome {
    /// Sizing result, if the test could be sized.
    #[must_use]
    pub fn analysis(&self) -> Option<&PowerAnalysis> {
        match self {
            Self::Computed(analysis) => Some(analysis),
            Self::NotComputable { .. } => None,
        }
    }

    #[must_use]
    pub fn metric(&self) -> RetentionMetric {
        match self {
            Self::Computed(analysis) => analysis.metric,
            Self::NotComputable { metric, .. } => *metric,
        }
    }
}

/// Sizes the experiment and compares it to the observed group sizes.
///
/// Fails only for invalid configured parameters; see [`PowerConfig::validate`].
pub fn analyze_power(dataset: &Dataset, config: &PowerConfig) -> Result<PowerOutcome, StatsError> {
    config.validate()?;
    let baseline = config
        .baseline
        .unwrap_or_else(|| dataset.retention_rate(Variant::Control, config.metric));
    if check_probability("baseline rate", baseline).is_err()
        || check_probability("target rate", baseline + config.mde).is_err()
    {
        tracing::warn!(
            baseline,
            mde = config.mde,
            "observed baseline leaves no room for the detectable change, power not computed"
        );
        return Ok(PowerOutcome::NotComputable {
            metric: config.metric,
            baseline,
            mde: config.mde,
        });
    }

    let required_per_group =
        power::required_sample_size(baseline, config.mde, config.power, config.alpha)?;
    let actual_per_group = dataset.counts().min();
    let achieved_power =
        power::achieved_power(baseline, config.mde, actual_per_group, config.alpha)?;
    let sufficient = actual_per_group >= required_per_group;

    if sufficient {
        tracing::info!(
            required_per_group,
            actual_per_group,
            achieved_power,
            "experiment is adequately powered"
        );
    } else {
        tracing::warn!(
            required_per_group,
            actual_per_group,
            achieved_power,
            "experiment is underpowered"
        );
    }

    Ok(PowerOutcome::Computed(PowerAnalysis {
        metric: config.metric,
        baseline,
        mde: config.mde,
        power: config.power,
        alpha: config.alpha,
        required_per_group,
        actual_per_group,
        achieved_power,
        sufficient,
    }))
}
