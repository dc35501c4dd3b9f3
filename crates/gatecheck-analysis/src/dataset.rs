//! Per-user experiment records and the dataset that groups them by variant
//!
//! # Data Structure
//!
//! ```text
//! Dataset
//! └─ records: Vec<UserRecord>   (input order preserved)
//!     ├─ user_id         unique key
//!     ├─ variant         control | treatment
//!     ├─ retention_1day  returned one day after install
//!     ├─ retention_7day  returned seven days after install
//!     └─ rounds_played   engagement count
//! ```
//!
//! A [`Dataset`] can only be built through [`Dataset::new`], which enforces
//! that the records are non-empty, user ids are unique, and both variants are
//! present. Records are never modified after construction; cleaning produces
//! a new dataset.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

/// Experiment arm a user was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Control,
    Treatment,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Variant {
    /// Both variants, control first.
    pub const ALL: [Self; 2] = [Self::Control, Self::Treatment];

    /// Lower-case name, as shown by `Display`.
    ///
    /// ```
    /// # use gatecheck_analysis::dataset::Variant;
    /// assert_eq!(Variant::Treatment.name(), "treatment");
    /// assert_eq!(Variant::Control.name(), Variant::Control.to_string());
    /// ```
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Treatment => "treatment",
        }
    }
}

/// Labels used for the two variants in input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantLabels {
    /// Label of the control group (the 30-level gate in the public data).
    pub control: String,
    /// Label of the treatment group (the 40-level gate).
    pub treatment: String,
}

impl Default for VariantLabels {
    fn default() -> Self {
        Self {
            control: "gate_30".to_owned(),
            treatment: "gate_40".to_owned(),
        }
    }
}

impl VariantLabels {
    /// Variant named by an input label, if it is one of the two.
    #[must_use]
    pub fn variant_of(&self, label: &str) -> Option<Variant> {
        if label == self.control {
            Some(Variant::Control)
        } else if label == self.treatment {
            Some(Variant::Treatment)
        } else {
            None
        }
    }

    /// Input label of `variant`.
    #[must_use]
    pub fn label(&self, variant: Variant) -> &str {
        match variant {
            Variant::Control => &self.control,
            Variant::Treatment => &self.treatment,
        }
    }
}

/// Which retention flag to analyse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum RetentionMetric {
    #[display("1-day retention")]
    Day1,
    #[display("7-day retention")]
    Day7,
}

impl RetentionMetric {
    /// Both metrics, 1-day first.
    pub const ALL: [Self; 2] = [Self::Day1, Self::Day7];
}

/// One user's row of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    /// Unique identifier of the user.
    pub user_id: u64,
    /// Experiment arm the user was assigned to.
    pub variant: Variant,
    /// Whether the user came back one day after installing.
    pub retention_1day: bool,
    /// Whether the user came back seven days after installing.
    pub retention_7day: bool,
    /// Game rounds played during the first 14 days.
    pub rounds_played: u64,
}

impl UserRecord {
    /// Retention flag selected by `metric`.
    #[must_use]
    pub fn retained(&self, metric: RetentionMetric) -> bool {
        match metric {
            RetentionMetric::Day1 => self.retention_1day,
            RetentionMetric::Day7 => self.retention_7day,
        }
    }
}

/// Number of users per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupCounts {
    /// Users in the control group.
    pub control: u64,
    /// Users in the treatment group.
    pub treatment: u64,
}

impl GroupCounts {
    /// Users in `variant`.
    #[must_use]
    pub fn get(&self, variant: Variant) -> u64 {
        match variant {
            Variant::Control => self.control,
            Variant::Treatment => self.treatment,
        }
    }

    /// Users in both groups.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.control + self.treatment
    }

    /// Size of the smaller group.
    #[must_use]
    pub fn min(&self) -> u64 {
        self.control.min(self.treatment)
    }
}

/// Reasons a set of records does not form a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("dataset contains no records")]
    Empty,
    #[display("user id {user_id} appears more than once")]
    DuplicateUserId { user_id: u64 },
    #[display("dataset contains no {variant} users")]
    MissingVariant { variant: Variant },
}

/// Validated, immutable collection of experiment records.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<UserRecord>,
}

impl Dataset {
    /// Validates `records` and wraps them, keeping their order.
    pub fn new(records: Vec<UserRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.user_id) {
                return Err(DatasetError::DuplicateUserId {
                    user_id: record.user_id,
                });
            }
        }
        let dataset = Self { records };
        let counts = dataset.counts();
        for variant in Variant::ALL {
            if counts.get(variant) == 0 {
                return Err(DatasetError::MissingVariant { variant });
            }
        }
        Ok(dataset)
    }

    #[must_use]
    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of users per variant.
    #[must_use]
    pub fn counts(&self) -> GroupCounts {
        self.records
            .iter()
            .fold(GroupCounts::default(), |mut counts, record| {
                match record.variant {
                    Variant::Control => counts.control += 1,
                    Variant::Treatment => counts.treatment += 1,
                }
                counts
            })
    }

    /// Records of one variant, in record order.
    pub fn variant(&self, variant: Variant) -> impl Iterator<Item = &UserRecord> + '_ {
        self.records.iter().filter(move |r| r.variant == variant)
    }

    /// Retention outcomes of one variant as `1.0` (retained) / `0.0`.
    #[must_use]
    pub fn retention_outcomes(&self, variant: Variant, metric: RetentionMetric) -> Vec<f64> {
        self.variant(variant)
            .map(|r| if r.retained(metric) { 1.0 } else { 0.0 })
            .collect()
    }

    /// Share of one variant's users that were retained.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn retention_rate(&self, variant: Variant, metric: RetentionMetric) -> f64 {
        let (retained, total) = self
            .variant(variant)
            .fold((0_u64, 0_u64), |(retained, total), r| {
                (retained + u64::from(r.retained(metric)), total + 1)
            });
        if total == 0 {
            return 0.0;
        }
        retained as f64 / total as f64
    }

    /// Rounds played by one variant's users, in record order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rounds(&self, variant: Variant) -> Vec<f64> {
        self.variant(variant)
            .map(|r| r.rounds_played as f64)
            .collect()
    }

    /// Rounds played by every user, in record order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn all_rounds(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.rounds_played as f64)
            .collect()
    }

    /// Splits the records by `keep`, returning the kept dataset and the dropped records.
    pub fn partition<F>(self, mut keep: F) -> Result<(Self, Vec<UserRecord>), DatasetError>
    where
        F: FnMut(&UserRecord) -> bool,
    {
        let (kept, dropped): (Vec<_>, Vec<_>) = self.records.into_iter().partition(|r| keep(r));
        Ok((Self::new(kept)?, dropped))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(user_id: u64, variant: Variant, rounds_played: u64) -> UserRecord {
        UserRecord {
            user_id,
            variant,
            retention_1day: rounds_played > 10,
            retention_7day: rounds_played > 50,
            rounds_played,
        }
    }

    /// Group sizes and retention counts of the public gate experiment.
    ///
    /// Control: 44 700 users, 20 034 retained after one day, 8 502 after
    /// seven. Treatment: 45 489 users, 20 119 and 8 279. User 0 is a retained
    /// control user with 49 854 rounds; every other user has fewer than 100.
    pub(crate) fn gate_experiment() -> Dataset {
        fn group(
            variant: Variant,
            ids: std::ops::Range<u64>,
            day1: u64,
            day7: u64,
            modulus: u64,
        ) -> impl Iterator<Item = UserRecord> {
            let start = ids.start;
            ids.map(move |user_id| {
                let nth = user_id - start;
                UserRecord {
                    user_id,
                    variant,
                    retention_1day: nth < day1,
                    retention_7day: nth < day7,
                    rounds_played: (nth * 7) % modulus,
                }
            })
        }

        let mut records = group(Variant::Control, 0..44_700, 20_034, 8_502, 100)
            .chain(group(Variant::Treatment, 44_700..90_189, 20_119, 8_279, 97))
            .collect::<Vec<_>>();
        records[0].rounds_played = 49_854;
        Dataset::new(records).unwrap()
    }

    #[test]
    fn test_gate_experiment_fixture() {
        let dataset = gate_experiment();
        assert_eq!(
            dataset.counts(),
            GroupCounts {
                control: 44_700,
                treatment: 45_489
            }
        );
        let control = dataset.retention_rate(Variant::Control, RetentionMetric::Day7);
        let treatment = dataset.retention_rate(Variant::Treatment, RetentionMetric::Day7);
        assert!((control - 0.1902).abs() < 1e-4);
        assert!((treatment - 0.1820).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Dataset::new(vec![]), Err(DatasetError::Empty));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let records = vec![
            record(1, Variant::Control, 3),
            record(2, Variant::Treatment, 4),
            record(1, Variant::Treatment, 5),
        ];
        assert_eq!(
            Dataset::new(records),
            Err(DatasetError::DuplicateUserId { user_id: 1 })
        );
    }

    #[test]
    fn test_rejects_single_variant() {
        let records = vec![record(1, Variant::Control, 3), record(2, Variant::Control, 4)];
        assert_eq!(
            Dataset::new(records),
            Err(DatasetError::MissingVariant {
                variant: Variant::Treatment
            })
        );
    }

    #[test]
    fn test_counts_and_rates() {
        let dataset = Dataset::new(vec![
            record(1, Variant::Control, 100),
            record(2, Variant::Control, 5),
            record(3, Variant::Treatment, 20),
            record(4, Variant::Treatment, 60),
            record(5, Variant::Treatment, 1),
        ])
        .unwrap();

        assert_eq!(
            dataset.counts(),
            GroupCounts {
                control: 2,
                treatment: 3
            }
        );
        assert_eq!(dataset.counts().min(), 2);
        assert_eq!(dataset.retention_rate(Variant::Control, RetentionMetric::Day7), 0.5);
        assert!(
            (dataset.retention_rate(Variant::Treatment, RetentionMetric::Day1) - 2.0 / 3.0).abs()
                < 1e-12
        );
        assert_eq!(dataset.rounds(Variant::Treatment), vec![20.0, 60.0, 1.0]);
        assert_eq!(
            dataset.retention_outcomes(Variant::Control, RetentionMetric::Day1),
            vec![1.0, 0.0]
        );
    }

    #[test]
    fn test_partition_keeps_order() {
        let dataset = Dataset::new(vec![
            record(1, Variant::Control, 100),
            record(2, Variant::Treatment, 5),
            record(3, Variant::Control, 7),
        ])
        .unwrap();
        let (kept, dropped) = dataset.partition(|r| r.rounds_played < 50).unwrap();
        assert_eq!(kept.records().iter().map(|r| r.user_id).collect::<Vec<_>>(), [2, 3]);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].user_id, 1);
    }

    #[test]
    fn test_variant_names_match_display() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string(), variant.name());
        }
        assert_eq!(
            DatasetError::MissingVariant {
                variant: Variant::Treatment
            }
            .to_string(),
            "dataset contains no treatment users"
        );
    }

    #[test]
    fn test_labels() {
        let labels = VariantLabels::default();
        assert_eq!(labels.variant_of("gate_30"), Some(Variant::Control));
        assert_eq!(labels.variant_of("gate_40"), Some(Variant::Treatment));
        assert_eq!(labels.variant_of("gate_50"), None);
        assert_eq!(labels.label(Variant::Treatment), "gate_40");
    }
}
