//! Plain-text rendering of an analysis report
//!
//! Tables follow a fixed column layout so that reports of different runs can
//! be compared with a plain diff.

use std::io::{self, Write};

use gatecheck_analysis::{
    dataset::Variant,
    power::PowerOutcome,
    report::{Recommendation, Report},
};
use gatecheck_stats::{comprehensive::ComprehensiveStats, histogram::Histogram};

use crate::util::format_amount;

const MAX_BAR_WIDTH: u64 = 50;
const MAX_LISTED_IDS: usize = 10;

pub(super) fn write_report<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "Progression Gate Experiment Report")?;
    writeln!(w, "==================================")?;
    writeln!(w)?;

    write_dataset(w, report)?;
    write_srm(w, report)?;
    write_cleaning(w, report)?;
    write_retention(w, report)?;
    write_engagement(w, report)?;
    write_power(w, report)?;
    write_impact(w, report)?;
    write_conclusion(w, report)?;
    Ok(())
}

fn section<W>(w: &mut W, title: &str) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "{title}")?;
    writeln!(w, "{}", "-".repeat(title.chars().count()))
}

fn variant_label(report: &Report, variant: Variant) -> String {
    format!("{variant} ({})", report.config.labels.label(variant))
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn points(difference: f64) -> String {
    format!("{:+.2}", difference * 100.0)
}

fn money(currency: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{currency}{}", format_amount(-amount))
    } else {
        format!("{currency}{}", format_amount(amount))
    }
}

fn write_dataset<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    section(w, "Dataset")?;
    writeln!(w, "  {:<24} {:>10} {:>10}", "Variant", "Loaded", "Analyzed")?;
    writeln!(w, "  {}", "-".repeat(46))?;
    for variant in Variant::ALL {
        writeln!(
            w,
            "  {:<24} {:>10} {:>10}",
            variant_label(report, variant),
            report.dataset.loaded.get(variant),
            report.dataset.analyzed.get(variant),
        )?;
    }
    writeln!(
        w,
        "  {:<24} {:>10} {:>10}",
        "total",
        report.dataset.loaded.total(),
        report.dataset.analyzed.total(),
    )?;
    writeln!(w)
}

fn write_srm<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    let srm = &report.srm;
    section(w, "Sample ratio mismatch check (chi-square, df = 1)")?;
    writeln!(w, "  Expected per group : {:.1}", srm.expected_per_group)?;
    writeln!(w, "  Chi-square         : {:.3}", srm.result.statistic)?;
    writeln!(
        w,
        "  p-value            : {:.4} (threshold {})",
        srm.result.p_value, srm.threshold
    )?;
    let verdict = if srm.mismatch {
        "MISMATCH, group assignment may be biased"
    } else {
        "consistent with an even split"
    };
    writeln!(w, "  Result             : {verdict}")?;
    writeln!(w)
}

fn write_cleaning<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    let cleaning = &report.cleaning;
    section(w, "Outlier removal")?;
    writeln!(w, "  Rule               : {}", cleaning.rule)?;
    let mut ids = cleaning
        .removed_user_ids
        .iter()
        .take(MAX_LISTED_IDS)
        .map(u64::to_string)
        .collect::<Vec<_>>();
    if cleaning.removed_count() > MAX_LISTED_IDS {
        ids.push("...".to_owned());
    }
    if ids.is_empty() {
        writeln!(w, "  Removed users      : 0")?;
    } else {
        writeln!(
            w,
            "  Removed users      : {} (ids: {})",
            cleaning.removed_count(),
            ids.join(", ")
        )?;
    }
    writeln!(
        w,
        "  Max rounds         : {:.0} -> {:.0}",
        cleaning.before.max, cleaning.after.max
    )?;
    writeln!(
        w,
        "  Mean rounds        : {:.2} -> {:.2}",
        cleaning.before.mean, cleaning.after.mean
    )?;
    writeln!(w)
}

fn write_retention<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    let bootstrap = &report.config.bootstrap;
    section(
        w,
        &format!(
            "Retention (bootstrap: {} iterations, seed {}, {:.0}% interval)",
            bootstrap.iterations,
            bootstrap.seed,
            bootstrap.confidence_level * 100.0
        ),
    )?;
    writeln!(
        w,
        "  {:<16} {:>9} {:>9} {:>9} {:>8} {:>18} {:>9} {:>9}",
        "Metric", "Control", "Treatment", "Diff(pp)", "Rel.", "Interval(pp)", "P(worse)", "P(better)",
    )?;
    writeln!(w, "  {}", "-".repeat(96))?;
    for retention in &report.retention {
        let interval = retention.bootstrap.interval;
        writeln!(
            w,
            "  {:<16} {:>9} {:>9} {:>9} {:>8} {:>18} {:>9} {:>9}",
            retention.metric.to_string(),
            percent(retention.control_rate),
            percent(retention.treatment_rate),
            points(retention.absolute_difference),
            format!("{:+.2}%", retention.relative_difference * 100.0),
            format!("[{}, {}]", points(interval.lower), points(interval.upper)),
            percent(retention.prob_worse()),
            percent(retention.prob_better()),
        )?;
    }
    writeln!(w)?;

    if let Some(retention) = report.retention(report.config.decision_metric) {
        writeln!(
            w,
            "  Bootstrap distribution of the {} difference (pp):",
            retention.metric
        )?;
        write_histogram(w, &retention.histogram, 100.0)?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_histogram<W>(w: &mut W, histogram: &Histogram, scale: f64) -> io::Result<()>
where
    W: Write,
{
    let max_count = histogram.max_count().max(1);
    for bin in &histogram.bins {
        let label = format!(
            "{:+.3}..{:+.3}",
            bin.range.start * scale,
            bin.range.end * scale
        );
        let bar_width = usize::try_from(bin.count * MAX_BAR_WIDTH / max_count).unwrap_or(0);
        writeln!(w, "  {:>18} | {:<6} {}", label, bin.count, "#".repeat(bar_width))?;
    }
    Ok(())
}

fn write_engagement<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    let engagement = &report.engagement;
    section(
        w,
        &format!(
            "Engagement: rounds played (Mann-Whitney U, alpha {})",
            engagement.alpha
        ),
    )?;
    writeln!(
        w,
        "  {:<24} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Variant", "Users", "Mean", "Median", "P75", "P90", "P99", "Max",
    )?;
    writeln!(w, "  {}", "-".repeat(91))?;
    for (variant, stats) in [
        (Variant::Control, &engagement.control),
        (Variant::Treatment, &engagement.treatment),
    ] {
        write_engagement_row(w, &variant_label(report, variant), stats)?;
    }
    writeln!(w)?;
    writeln!(w, "  U (control)        : {:.1}", engagement.result.statistic)?;
    writeln!(w, "  p-value            : {:.4}", engagement.result.p_value)?;
    writeln!(
        w,
        "  P(control > treatment) : {:.4}",
        engagement.result.effect_estimate
    )?;
    let verdict = if engagement.significant {
        "significant difference in engagement"
    } else {
        "no significant difference in engagement"
    };
    writeln!(w, "  Result             : {verdict}")?;
    writeln!(w)
}

fn write_engagement_row<W>(w: &mut W, label: &str, stats: &ComprehensiveStats) -> io::Result<()>
where
    W: Write,
{
    let percentile = |p| stats.percentiles.get(p).unwrap_or(f64::NAN);
    writeln!(
        w,
        "  {:<24} {:>8} {:>9.2} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.0}",
        label,
        stats.stats.count,
        stats.stats.mean,
        stats.stats.median,
        percentile(75.0),
        percentile(90.0),
        percentile(99.0),
        stats.stats.max,
    )
}

fn write_power<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    section(w, &format!("Power analysis ({})", report.power.metric()))?;
    let power = match report.power {
        PowerOutcome::Computed(analysis) => analysis,
        PowerOutcome::NotComputable { baseline, mde, .. } => {
            writeln!(w, "  Baseline rate      : {}", percent(baseline))?;
            writeln!(w, "  Detectable change  : {} pp", points(mde))?;
            writeln!(w, "  Result             : NOT COMPUTED, target rate outside (0, 1)")?;
            return writeln!(w);
        }
    };
    writeln!(w, "  Baseline rate      : {}", percent(power.baseline))?;
    writeln!(w, "  Detectable change  : {} pp", points(power.mde))?;
    writeln!(
        w,
        "  Power / alpha      : {:.2} / {}",
        power.power, power.alpha
    )?;
    #[expect(clippy::cast_precision_loss)]
    let (required, actual) = (
        power.required_per_group as f64,
        power.actual_per_group as f64,
    );
    writeln!(w, "  Required per group : {}", format_amount(required))?;
    writeln!(w, "  Smallest group     : {}", format_amount(actual))?;
    writeln!(w, "  Achieved power     : {:.3}", power.achieved_power)?;
    let verdict = if power.sufficient {
        "adequately powered"
    } else {
        "UNDERPOWERED"
    };
    writeln!(w, "  Result             : {verdict}")?;
    writeln!(w)
}

fn write_impact<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    let impact = &report.impact;
    #[expect(clippy::cast_precision_loss)]
    let user_base = impact.user_base as f64;
    section(
        w,
        &format!(
            "Business impact ({}, {} users, {} per retained user)",
            impact.metric,
            format_amount(user_base),
            money(&impact.currency, impact.value_per_retained_user)
        ),
    )?;
    writeln!(
        w,
        "  Retention change   : {} pp",
        points(impact.retention_delta)
    )?;
    writeln!(
        w,
        "  Retained users     : {}",
        format_amount(impact.retained_user_change)
    )?;
    writeln!(
        w,
        "  Revenue            : {}",
        money(&impact.currency, impact.monetary_impact)
    )?;
    writeln!(w)
}

fn write_conclusion<W>(w: &mut W, report: &Report) -> io::Result<()>
where
    W: Write,
{
    section(w, "Caveats")?;
    for caveat in &report.caveats {
        writeln!(w, "  - {caveat}")?;
    }
    writeln!(w)?;

    let marker = match report.recommendation {
        Recommendation::Deploy => "DEPLOY",
        Recommendation::DoNotDeploy => "DO NOT DEPLOY",
        Recommendation::Inconclusive => "INCONCLUSIVE",
    };
    writeln!(w, "Recommendation: {marker} ({})", report.recommendation)?;
    if let Some(retention) = report.retention(report.config.decision_metric) {
        writeln!(
            w,
            "  based on {}: P(worse) = {}, P(better) = {}, required confidence {}",
            retention.metric,
            percent(retention.prob_worse()),
            percent(retention.prob_better()),
            percent(report.config.decision_confidence),
        )?;
    }
    Ok(())
}
