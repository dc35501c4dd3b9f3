//! Synthetic experiment data with the shape of the real gate experiment
//!
//! Useful for demonstrations and tests when the real dataset is not at hand.
//! The generator reproduces the properties that matter to the analysis:
//!
//! - a slightly unbalanced split (49.5% control)
//! - right-skewed engagement (geometric rounds, mean about 49)
//! - retention that rises with engagement and is a little lower in treatment
//! - one extreme outlier in the first record

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Geometric};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DatasetError, UserRecord, Variant};

/// Parameters of the synthetic generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub num_users: usize,
    pub seed: u64,
    /// Probability that a user is assigned to control.
    pub control_share: f64,
    pub first_user_id: u64,
    /// Success probability of the geometric distribution of rounds played.
    pub rounds_success_prob: f64,
    /// Rounds written into the first record, if any.
    pub outlier_rounds: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_users: 90_189,
            seed: 42,
            control_share: 0.495,
            first_user_id: 10_000,
            rounds_success_prob: 0.02,
            outlier_rounds: Some(49_854),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GenerateError {
    #[display("{name} must lie strictly between 0 and 1, got {value}")]
    #[from(ignore)]
    InvalidProbability { name: &'static str, value: f64 },
    #[display("generated data is not a valid dataset: {_0}")]
    Dataset(DatasetError),
}

fn check_probability(name: &'static str, value: f64) -> Result<(), GenerateError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(GenerateError::InvalidProbability { name, value })
    }
}

/// Probability of 1-day and 7-day retention for a user with `rounds` rounds.
#[expect(clippy::cast_precision_loss)]
fn retention_probabilities(variant: Variant, rounds: u64) -> (f64, f64) {
    let rounds = rounds as f64;
    let day1 = f64::min(0.85, 0.10 + rounds / 50.0);
    let day7 = f64::min(0.60, 0.05 + rounds / 100.0);
    match variant {
        Variant::Control => (day1, day7),
        Variant::Treatment => (day1 * 0.99, day7 * 0.96),
    }
}

/// Generates a synthetic dataset. The same config always yields the same data.
pub fn generate(config: &SyntheticConfig) -> Result<Dataset, GenerateError> {
    check_probability("control share", config.control_share)?;
    check_probability("rounds success probability", config.rounds_success_prob)?;
    let rounds_distr = Geometric::new(config.rounds_success_prob).map_err(|_| {
        GenerateError::InvalidProbability {
            name: "rounds success probability",
            value: config.rounds_success_prob,
        }
    })?;

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut records = (0..config.num_users)
        .zip(config.first_user_id..)
        .map(|(_, user_id)| {
            let variant = if rng.random_bool(config.control_share) {
                Variant::Control
            } else {
                Variant::Treatment
            };
            let rounds_played = rounds_distr.sample(&mut rng);
            let (p_day1, p_day7) = retention_probabilities(variant, rounds_played);
            UserRecord {
                user_id,
                variant,
                retention_1day: rng.random_bool(p_day1),
                retention_7day: rng.random_bool(p_day7),
                rounds_played,
            }
        })
        .collect::<Vec<_>>();

    if let (Some(first), Some(rounds)) = (records.first_mut(), config.outlier_rounds) {
        first.rounds_played = rounds;
    }

    tracing::debug!(users = records.len(), seed = config.seed, "synthetic data generated");
    Ok(Dataset::new(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RetentionMetric;

    fn small(num_users: usize) -> SyntheticConfig {
        SyntheticConfig {
            num_users,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn test_is_deterministic() {
        let a = generate(&small(2_000)).unwrap();
        let b = generate(&small(2_000)).unwrap();
        assert_eq!(a, b);

        let c = generate(&SyntheticConfig {
            seed: 7,
            ..small(2_000)
        })
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_shape_resembles_real_data() {
        let dataset = generate(&small(20_000)).unwrap();
        let counts = dataset.counts();
        assert_eq!(counts.total(), 20_000);
        #[expect(clippy::cast_precision_loss)]
        let control_share = counts.control as f64 / counts.total() as f64;
        assert!((control_share - 0.495).abs() < 0.02);

        let first = dataset.records()[0];
        assert_eq!(first.user_id, 10_000);
        assert_eq!(first.rounds_played, 49_854);

        let day1 = dataset.retention_rate(Variant::Control, RetentionMetric::Day1);
        let day7 = dataset.retention_rate(Variant::Control, RetentionMetric::Day7);
        assert!(day1 > day7);
    }

    #[test]
    fn test_retention_probability_is_capped_and_lower_in_treatment() {
        assert_eq!(retention_probabilities(Variant::Control, 10_000), (0.85, 0.60));
        let (c1, c7) = retention_probabilities(Variant::Control, 20);
        let (t1, t7) = retention_probabilities(Variant::Treatment, 20);
        assert!(t1 < c1);
        assert!(t7 < c7);
    }

    #[test]
    fn test_rejects_invalid_probabilities() {
        let config = SyntheticConfig {
            control_share: 1.0,
            ..SyntheticConfig::default()
        };
        assert!(matches!(
            generate(&config),
            Err(GenerateError::InvalidProbability {
                name: "control share",
                ..
            })
        ));
        assert!(matches!(
            generate(&small(0)),
            Err(GenerateError::Dataset(DatasetError::Empty))
        ));
    }
}
