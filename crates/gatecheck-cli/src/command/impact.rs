use gatecheck_analysis::impact::{ImpactConfig, estimate_impact};

use crate::util::format_amount;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ImpactArg {
    /// Retention rate change, treatment minus control (e.g. -0.0082)
    #[arg(long, allow_hyphen_values = true)]
    delta: f64,
    /// Size of the user base the change applies to
    #[arg(long, default_value_t = 100_000)]
    users: u64,
    /// Value of one retained user
    #[arg(long, default_value_t = 500.0)]
    value: f64,
    /// Currency symbol used in the output
    #[arg(long, default_value = "₹")]
    currency: String,
}

pub(crate) fn run(arg: &ImpactArg) -> anyhow::Result<()> {
    let config = ImpactConfig {
        user_base: arg.users,
        value_per_retained_user: arg.value,
        currency: arg.currency.clone(),
        ..ImpactConfig::default()
    };
    let impact = estimate_impact(arg.delta, &config);

    let sign = if impact.monetary_impact < 0.0 { "-" } else { "" };
    println!("Business impact");
    println!("===============");
    println!("  Retention change   : {:+.2} pp", impact.retention_delta * 100.0);
    println!(
        "  Retained users     : {} of {}",
        format_amount(impact.retained_user_change),
        arg.users
    );
    println!(
        "  Revenue            : {sign}{}{}",
        impact.currency,
        format_amount(impact.monetary_impact.abs())
    );
    println!("  (point estimate; the uncertainty of the delta is not propagated)");
    Ok(())
}
