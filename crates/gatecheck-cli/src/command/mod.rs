use clap::{ArgAction, Parser, Subcommand};

use self::{analyze::AnalyzeArg, generate::GenerateArg, impact::ImpactArg, power::PowerArg};

mod analyze;
mod generate;
mod impact;
mod power;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Analyze an experiment CSV file and print the report
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Generate a synthetic experiment CSV file
    Generate(#[clap(flatten)] GenerateArg),
    /// Compute the required sample size per group
    Power(#[clap(flatten)] PowerArg),
    /// Translate a retention change into users and revenue
    Impact(#[clap(flatten)] ImpactArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    crate::init_tracing(args.verbose);
    match args.mode {
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::Generate(arg) => generate::run(&arg)?,
        Mode::Power(arg) => power::run(&arg)?,
        Mode::Impact(arg) => impact::run(&arg)?,
    }
    Ok(())
}
