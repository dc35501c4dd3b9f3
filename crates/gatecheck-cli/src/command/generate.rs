use std::path::PathBuf;

use anyhow::Context;
use gatecheck_analysis::{
    dataset::VariantLabels,
    loader,
    synthetic::{self, SyntheticConfig},
};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of users to generate
    #[arg(long, default_value_t = 90_189)]
    num_users: usize,
    /// Seed of the generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Leave out the extreme-engagement user
    #[arg(long)]
    no_outlier: bool,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    let defaults = SyntheticConfig::default();
    let config = SyntheticConfig {
        num_users: arg.num_users,
        seed: arg.seed,
        outlier_rounds: if arg.no_outlier {
            None
        } else {
            defaults.outlier_rounds
        },
        ..defaults
    };

    let dataset = synthetic::generate(&config).context("Failed to generate synthetic data")?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    loader::write_csv(&mut output, &dataset, &VariantLabels::default())
        .with_context(|| format!("Failed to write CSV to {}", output.display_path()))?;
    output.finish()?;

    let counts = dataset.counts();
    eprintln!(
        "Generated {} users ({} control, {} treatment) to {}",
        counts.total(),
        counts.control,
        counts.treatment,
        output.display_path()
    );
    Ok(())
}
