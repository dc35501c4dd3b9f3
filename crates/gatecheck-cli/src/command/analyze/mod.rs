//! Experiment analysis command
//!
//! Loads an experiment CSV file, runs the full pipeline and writes the report
//! as text or JSON.

mod render;

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use gatecheck_analysis::{cleaning::OutlierRule, config::AnalysisConfig, loader, pipeline};

use crate::util::{self, Output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the experiment CSV file
    data: PathBuf,

    /// Analysis configuration JSON file; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed of the bootstrap generator
    #[arg(long)]
    seed: Option<u64>,

    /// Number of bootstrap iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Outlier rule: none, threshold:N, percentile:P or ratio:R
    #[arg(long)]
    outlier_rule: Option<OutlierRule>,

    /// SRM p-value below which the group split is flagged
    #[arg(long)]
    srm_threshold: Option<f64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl AnalyzeArg {
    fn build_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("analysis config", path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.bootstrap.seed = seed;
        }
        if let Some(iterations) = self.iterations {
            config.bootstrap.iterations = iterations;
        }
        if let Some(rule) = self.outlier_rule {
            config.outlier_rule = rule;
        }
        if let Some(threshold) = self.srm_threshold {
            config.srm_threshold = threshold;
        }

        anyhow::ensure!(
            config.srm_threshold > 0.0 && config.srm_threshold < 1.0,
            "SRM threshold must lie strictly between 0 and 1, got {}",
            config.srm_threshold
        );
        anyhow::ensure!(
            config.decision_confidence > 0.0 && config.decision_confidence < 1.0,
            "decision confidence must lie strictly between 0 and 1, got {}",
            config.decision_confidence
        );
        Ok(config)
    }
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let config = arg.build_config()?;

    let file = File::open(&arg.data)
        .with_context(|| format!("Failed to open experiment data: {}", arg.data.display()))?;
    let dataset = loader::read_csv(BufReader::new(file), &config.labels)
        .with_context(|| format!("Failed to load experiment data: {}", arg.data.display()))?;

    let report = pipeline::run(dataset, &config).context("Analysis failed")?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    match arg.format {
        Format::Json => output.write_json(&report)?,
        Format::Text => {
            render::write_report(&mut output, &report)
                .with_context(|| format!("Failed to write report to {}", output.display_path()))?;
            output.finish()?;
        }
    }
    if output.is_file() {
        eprintln!("Report written to {}", output.display_path());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        arg: AnalyzeArg,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "analyze",
            "data.csv",
            "--seed",
            "7",
            "--iterations",
            "500",
            "--outlier-rule",
            "percentile:99.9",
            "--srm-threshold",
            "0.05",
            "--format",
            "json",
        ]);
        assert_eq!(cli.arg.format, Format::Json);

        let config = cli.arg.build_config().unwrap();
        assert_eq!(config.bootstrap.seed, 7);
        assert_eq!(config.bootstrap.iterations, 500);
        assert_eq!(
            config.outlier_rule,
            OutlierRule::Percentile { percentile: 99.9 }
        );
        assert_eq!(config.srm_threshold, 0.05);
        assert_eq!(config.impact.user_base, 100_000);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        assert!(Cli::try_parse_from(["analyze", "data.csv", "--outlier-rule", "max:3"]).is_err());

        let cli = Cli::parse_from(["analyze", "data.csv", "--srm-threshold", "1.5"]);
        assert!(cli.arg.build_config().is_err());
    }
}
