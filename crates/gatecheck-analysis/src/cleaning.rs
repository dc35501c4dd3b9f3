//! Removal of implausible engagement values
//!
//! A single user with tens of thousands of rounds is enough to distort the
//! mean engagement of a whole variant. Which users count as outliers is an
//! explicit [`OutlierRule`] rather than a hard-coded value, so the choice is
//! visible in the configuration and in the report.
//!
//! Rules can be written compactly, which is how the CLI accepts them:
//!
//! | text              | meaning                                                 |
//! |-------------------|---------------------------------------------------------|
//! | `none`            | keep every record                                       |
//! | `threshold:3000`  | drop records with at least 3000 rounds                  |
//! | `percentile:99.9` | drop records above the 99.9th percentile of rounds      |
//! | `ratio:10`        | drop the maximum while it exceeds 10× the next value    |
//!
//! The `ratio` chain stops at the first gap to zero rounds.

use std::{fmt, str::FromStr};

use gatecheck_stats::{descriptive::DescriptiveStats, percentiles};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DatasetError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlierRule {
    None,
    Threshold { cutoff: u64 },
    Percentile { percentile: f64 },
    Ratio { ratio: f64 },
}

impl Default for OutlierRule {
    fn default() -> Self {
        Self::Threshold { cutoff: 3000 }
    }
}

impl fmt::Display for OutlierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Threshold { cutoff } => write!(f, "threshold:{cutoff}"),
            Self::Percentile { percentile } => write!(f, "percentile:{percentile}"),
            Self::Ratio { ratio } => write!(f, "ratio:{ratio}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid outlier rule '{input}': {reason}")]
pub struct ParseOutlierRuleError {
    input: String,
    reason: &'static str,
}

impl FromStr for OutlierRule {
    type Err = ParseOutlierRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason| ParseOutlierRuleError {
            input: s.to_owned(),
            reason,
        };
        let (kind, param) = match s.split_once(':') {
            Some((kind, param)) => (kind.trim(), Some(param.trim())),
            None => (s.trim(), None),
        };
        match (kind, param) {
            ("none", None) => Ok(Self::None),
            ("threshold", Some(param)) => {
                let cutoff = param
                    .parse()
                    .map_err(|_| error("cutoff must be a non-negative integer"))?;
                Ok(Self::Threshold { cutoff })
            }
            ("percentile", Some(param)) => {
                let percentile = param
                    .parse::<f64>()
                    .ok()
                    .filter(|p| (0.0..=100.0).contains(p))
                    .ok_or_else(|| error("percentile must be a number between 0 and 100"))?;
                Ok(Self::Percentile { percentile })
            }
            ("ratio", Some(param)) => {
                let ratio = param
                    .parse::<f64>()
                    .ok()
                    .filter(|r| *r >= 1.0)
                    .ok_or_else(|| error("ratio must be a number of at least 1"))?;
                Ok(Self::Ratio { ratio })
            }
            ("none", Some(_)) => Err(error("'none' takes no parameter")),
            ("threshold" | "percentile" | "ratio", None) => Err(error("missing parameter")),
            _ => Err(error("expected none, threshold:N, percentile:P or ratio:R")),
        }
    }
}

impl OutlierRule {
    /// Smallest number of rounds that gets a record removed, for the given data.
    ///
    /// Returns `None` if the rule removes nothing.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn removal_floor(&self, rounds: &[u64]) -> Option<u64> {
        match *self {
            Self::None => None,
            Self::Threshold { cutoff } => Some(cutoff),
            Self::Percentile { percentile } => {
                let mut sorted = rounds.iter().map(|&r| r as f64).collect::<Vec<_>>();
                sorted.sort_by(f64::total_cmp);
                let value = percentiles::compute_percentile(&sorted, percentile);
                // Strictly above the percentile value
                Some(value.floor() as u64 + 1)
            }
            Self::Ratio { ratio } => {
                let mut distinct = rounds.to_vec();
                distinct.sort_unstable_by(|a, b| b.cmp(a));
                distinct.dedup();
                let mut floor = None;
                for pair in distinct.windows(2) {
                    let (top, next) = (pair[0], pair[1]);
                    // Any count is an unbounded multiple of zero
                    if next == 0 {
                        break;
                    }
                    if top as f64 > ratio * next as f64 {
                        floor = Some(top);
                    } else {
                        break;
                    }
                }
                floor
            }
        }
    }
}

/// What the cleaner removed and how the engagement column changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub rule: OutlierRule,
    pub removed_user_ids: Vec<u64>,
    /// Engagement over all users before cleaning.
    pub before: DescriptiveStats,
    /// Engagement over all users after cleaning.
    pub after: DescriptiveStats,
}

impl CleaningSummary {
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed_user_ids.len()
    }
}

/// Applies `rule` to the dataset and returns the cleaned dataset with a summary.
///
/// Fails only if cleaning would leave a variant without users.
pub fn remove_outliers(
    dataset: Dataset,
    rule: &OutlierRule,
) -> Result<(Dataset, CleaningSummary), DatasetError> {
    let rounds = dataset
        .records()
        .iter()
        .map(|r| r.rounds_played)
        .collect::<Vec<_>>();
    let floor = rule.removal_floor(&rounds);
    let before = engagement_stats(&dataset)?;

    let (cleaned, removed) = match floor {
        Some(floor) => dataset.partition(|r| r.rounds_played < floor)?,
        None => (dataset, vec![]),
    };
    let after = engagement_stats(&cleaned)?;

    if removed.is_empty() {
        tracing::info!(%rule, "no outliers removed");
    } else {
        tracing::info!(
            %rule,
            removed = removed.len(),
            max_before = before.max,
            max_after = after.max,
            "outliers removed"
        );
    }

    let summary = CleaningSummary {
        rule: *rule,
        removed_user_ids: removed.iter().map(|r| r.user_id).collect(),
        before,
        after,
    };
    Ok((cleaned, summary))
}

fn engagement_stats(dataset: &Dataset) -> Result<DescriptiveStats, DatasetError> {
    DescriptiveStats::new(dataset.all_rounds()).ok_or(DatasetError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Variant, tests::record};

    fn skewed_dataset() -> Dataset {
        let mut records = (0..200)
            .map(|i| {
                let variant = if i % 2 == 0 {
                    Variant::Control
                } else {
                    Variant::Treatment
                };
                record(i, variant, i % 40)
            })
            .collect::<Vec<_>>();
        records[0].rounds_played = 49_854;
        Dataset::new(records).unwrap()
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!("none".parse::<OutlierRule>(), Ok(OutlierRule::None));
        assert_eq!(
            "threshold:3000".parse::<OutlierRule>(),
            Ok(OutlierRule::Threshold { cutoff: 3000 })
        );
        assert_eq!(
            "percentile: 99.5".parse::<OutlierRule>(),
            Ok(OutlierRule::Percentile { percentile: 99.5 })
        );
        assert_eq!("ratio:10".parse::<OutlierRule>(), Ok(OutlierRule::Ratio { ratio: 10.0 }));

        for bad in [
            "",
            "threshold",
            "threshold:-1",
            "percentile:120",
            "ratio:0.5",
            "none:1",
            "max:3",
        ] {
            assert!(bad.parse::<OutlierRule>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_display_parses_back() {
        for rule in [
            OutlierRule::None,
            OutlierRule::Threshold { cutoff: 3000 },
            OutlierRule::Percentile { percentile: 99.9 },
            OutlierRule::Ratio { ratio: 2.5 },
        ] {
            assert_eq!(rule.to_string().parse::<OutlierRule>(), Ok(rule));
        }
    }

    #[test]
    fn test_removing_outlier_lowers_max_and_mean() {
        for rule in [
            OutlierRule::Threshold { cutoff: 3000 },
            OutlierRule::Percentile { percentile: 99.0 },
            OutlierRule::Ratio { ratio: 10.0 },
        ] {
            let (cleaned, summary) = remove_outliers(skewed_dataset(), &rule).unwrap();
            assert_eq!(summary.removed_user_ids, vec![0], "{rule}");
            assert_eq!(cleaned.len(), 199);
            assert!(summary.after.max < summary.before.max);
            assert!(summary.after.mean < summary.before.mean);
        }
    }

    #[test]
    fn test_none_keeps_everything() {
        let (cleaned, summary) = remove_outliers(skewed_dataset(), &OutlierRule::None).unwrap();
        assert_eq!(cleaned, skewed_dataset());
        assert_eq!(summary.removed_count(), 0);
        assert_eq!(summary.before, summary.after);
    }

    #[test]
    fn test_ratio_stops_at_plausible_gap() {
        let records = vec![
            record(1, Variant::Control, 10),
            record(2, Variant::Treatment, 12),
            record(3, Variant::Control, 15),
        ];
        let dataset = Dataset::new(records).unwrap();
        let (cleaned, summary) =
            remove_outliers(dataset, &OutlierRule::Ratio { ratio: 2.0 }).unwrap();
        assert_eq!(cleaned.len(), 3);
        assert_eq!(summary.removed_count(), 0);
    }

    #[test]
    fn test_ratio_removes_chain_of_outliers() {
        let records = vec![
            record(1, Variant::Control, 10),
            record(2, Variant::Treatment, 12),
            record(3, Variant::Control, 500),
            record(4, Variant::Treatment, 50_000),
        ];
        let dataset = Dataset::new(records).unwrap();
        let (_, summary) = remove_outliers(dataset, &OutlierRule::Ratio { ratio: 10.0 }).unwrap();
        assert_eq!(summary.removed_user_ids, vec![3, 4]);
    }

    #[test]
    fn test_cleaning_cannot_empty_a_variant() {
        let records = vec![
            record(1, Variant::Control, 10),
            record(2, Variant::Treatment, 5_000),
        ];
        let dataset = Dataset::new(records).unwrap();
        assert_eq!(
            remove_outliers(dataset, &OutlierRule::Threshold { cutoff: 3000 }),
            Err(DatasetError::MissingVariant {
                variant: Variant::Treatment
            })
        );
    }

    #[test]
    fn test_ratio_ignores_gap_to_zero_rounds() {
        let mut records = (0..10)
            .map(|i| {
                let variant = if i % 2 == 0 {
                    Variant::Control
                } else {
                    Variant::Treatment
                };
                record(i, variant, 0)
            })
            .collect::<Vec<_>>();
        records.push(record(100, Variant::Control, 1));
        records.push(record(101, Variant::Treatment, 1));
        records.push(record(102, Variant::Treatment, 49_854));
        let dataset = Dataset::new(records).unwrap();

        let (cleaned, summary) =
            remove_outliers(dataset, &OutlierRule::Ratio { ratio: 10.0 }).unwrap();
        assert_eq!(summary.removed_user_ids, vec![102]);
        assert_eq!(cleaned.len(), 12);
    }

    #[test]
    fn test_ratio_with_only_zero_below_removes_nothing() {
        let records = vec![
            record(1, Variant::Control, 0),
            record(2, Variant::Treatment, 0),
            record(3, Variant::Control, 5_000),
        ];
        let dataset = Dataset::new(records).unwrap();
        let (_, summary) = remove_outliers(dataset, &OutlierRule::Ratio { ratio: 10.0 }).unwrap();
        assert_eq!(summary.removed_count(), 0);
    }

    #[test]
    fn test_percentile_boundaries() {
        let (cleaned, summary) =
            remove_outliers(skewed_dataset(), &OutlierRule::Percentile { percentile: 100.0 })
                .unwrap();
        assert_eq!(summary.removed_count(), 0);
        assert_eq!(cleaned.len(), 200);

        // Everything above the minimum goes
        let records = vec![
            record(1, Variant::Control, 0),
            record(2, Variant::Treatment, 0),
            record(3, Variant::Control, 5),
            record(4, Variant::Treatment, 7),
        ];
        let dataset = Dataset::new(records).unwrap();
        let (cleaned, summary) =
            remove_outliers(dataset, &OutlierRule::Percentile { percentile: 0.0 }).unwrap();
        assert_eq!(summary.removed_user_ids, vec![3, 4]);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(summary.after.max, 0.0);

        // Only control users have the minimum of zero rounds
        assert_eq!(
            remove_outliers(skewed_dataset(), &OutlierRule::Percentile { percentile: 0.0 }),
            Err(DatasetError::MissingVariant {
                variant: Variant::Treatment
            })
        );
    }
}
