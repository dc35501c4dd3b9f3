//! Analysis of the progression-gate A/B experiment
//!
//! This crate turns per-user experiment records into a [`report::Report`]
//! with a deployment recommendation. The statistics themselves live in
//! `gatecheck_stats`; this crate supplies the experiment domain around them.
//!
//! # Overview
//!
//! 1. **Load Data** ([`loader::read_csv`]): Read and validate per-user records
//!    into a [`dataset::Dataset`], or generate one ([`synthetic::generate`])
//! 2. **Check Integrity** ([`integrity::check_sample_ratio`]): Chi-square test of
//!    the group split against 50/50
//! 3. **Remove Outliers** ([`cleaning::remove_outliers`]): Apply an explicit
//!    [`cleaning::OutlierRule`] to rounds played
//! 4. **Estimate Retention** ([`retention::estimate_retention`]): Seeded bootstrap
//!    of the 1-day and 7-day retention difference
//! 5. **Test Engagement** ([`engagement::compare_engagement`]): Mann-Whitney U test
//!    of rounds played
//! 6. **Analyze Power** ([`power::analyze_power`]): Required versus actual sample size
//! 7. **Estimate Impact** ([`impact::estimate_impact`]): Retained users and revenue
//!    for a user base
//!
//! [`pipeline::run`] performs steps 2-7 with an [`config::AnalysisConfig`].
//!
//! # Examples
//!
//! ```
//! use gatecheck_analysis::{
//!     config::AnalysisConfig,
//!     pipeline,
//!     synthetic::{SyntheticConfig, generate},
//! };
//!
//! let dataset = generate(&SyntheticConfig {
//!     num_users: 2_000,
//!     ..SyntheticConfig::default()
//! })
//! .unwrap();
//!
//! let mut config = AnalysisConfig::default();
//! config.bootstrap.iterations = 100;
//!
//! let report = pipeline::run(dataset, &config).unwrap();
//! assert_eq!(report.cleaning.removed_count(), 1);
//! assert_eq!(report.retention.len(), 2);
//! ```

pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod engagement;
pub mod impact;
pub mod integrity;
pub mod loader;
pub mod pipeline;
pub mod power;
pub mod report;
pub mod retention;
pub mod synthetic;
