use gatecheck_stats::power;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PowerArg {
    /// Baseline retention rate, e.g. 0.19
    #[arg(long)]
    baseline: f64,
    /// Minimum detectable absolute change in the rate, e.g. 0.01
    #[arg(long, allow_hyphen_values = true)]
    mde: f64,
    /// Desired statistical power
    #[arg(long, default_value_t = 0.8)]
    power: f64,
    /// Two-sided significance level
    #[arg(long, default_value_t = 0.05)]
    alpha: f64,
    /// Users available per group; reports the power they achieve
    #[arg(long)]
    users_per_group: Option<u64>,
}

pub(crate) fn run(arg: &PowerArg) -> anyhow::Result<()> {
    let required = power::required_sample_size(arg.baseline, arg.mde, arg.power, arg.alpha)?;
    tracing::debug!(required, "sample size computed");

    println!("Two-proportion power analysis");
    println!("=============================");
    println!("  Baseline rate      : {:.2}%", arg.baseline * 100.0);
    println!("  Detectable change  : {:+.2} pp", arg.mde * 100.0);
    println!("  Power / alpha      : {} / {}", arg.power, arg.alpha);
    println!("  Required per group : {required}");
    println!("  Required in total  : {}", required.saturating_mul(2));

    if let Some(users) = arg.users_per_group {
        let achieved = power::achieved_power(arg.baseline, arg.mde, users, arg.alpha)?;
        let verdict = if users >= required {
            "adequately powered"
        } else {
            "UNDERPOWERED"
        };
        println!("  Users per group    : {users}");
        println!("  Achieved power     : {achieved:.3} ({verdict})");
    }
    Ok(())
}
