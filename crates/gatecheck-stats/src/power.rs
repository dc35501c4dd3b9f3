//! Power analysis for comparing two proportions.
//!
//! With baseline rate `p₁`, target rate `p₂ = p₁ + δ`, pooled rate
//! `p̄ = (p₁ + p₂) / 2` and `q = 1 - p`, the per-group sample size of a
//! two-sided test at level `α` with power `1 - β` is
//!
//! ```text
//! n = (z[1-α/2] · √(2·p̄·q̄) + z[1-β] · √(p₁q₁ + p₂q₂))² / δ²
//! ```

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{StatsError, check_probability};

/// Rates involved in a two-proportion comparison, validated.
#[derive(Debug, Clone, Copy)]
struct Proportions {
    effect: f64,
    /// `√(2·p̄·q̄)`: standard deviation under the null hypothesis.
    null_sd: f64,
    /// `√(p₁q₁ + p₂q₂)`: standard deviation under the alternative.
    alt_sd: f64,
}

impl Proportions {
    fn new(baseline: f64, mde: f64) -> Result<Self, StatsError> {
        check_probability("baseline rate", baseline)?;
        if mde == 0.0 {
            return Err(StatsError::ZeroEffect);
        }
        let target = baseline + mde;
        check_probability("target rate", target)?;

        let pooled = f64::midpoint(baseline, target);
        Ok(Self {
            effect: mde.abs(),
            null_sd: (2.0 * pooled * (1.0 - pooled)).sqrt(),
            alt_sd: (baseline * (1.0 - baseline) + target * (1.0 - target)).sqrt(),
        })
    }
}

/// Required per-group sample size to detect an absolute change `mde` from
/// `baseline` with the given power at two-sided significance level `alpha`.
///
/// `mde` may be negative to size a test for a drop.
///
/// # Examples
///
/// ```
/// use gatecheck_stats::power::required_sample_size;
///
/// let n = required_sample_size(0.19, -0.01, 0.8, 0.05).unwrap();
/// assert!(n > 20_000 && n < 30_000);
///
/// // Halving the effect roughly quadruples the sample size
/// let small = required_sample_size(0.19, -0.005, 0.8, 0.05).unwrap();
/// assert!(small > 3 * n);
/// ```
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn required_sample_size(
    baseline: f64,
    mde: f64,
    power: f64,
    alpha: f64,
) -> Result<u64, StatsError> {
    let proportions = Proportions::new(baseline, mde)?;
    check_probability("power", power)?;
    check_probability("alpha", alpha)?;

    let normal = Normal::standard();
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z_beta = normal.inverse_cdf(power);

    let numerator = z_alpha * proportions.null_sd + z_beta * proportions.alt_sd;
    let n = (numerator / proportions.effect).powi(2);
    Ok(n.ceil() as u64)
}

/// Power achieved with `n_per_group` users in each group.
///
/// ```
/// use gatecheck_stats::power::{achieved_power, required_sample_size};
///
/// let n = required_sample_size(0.20, 0.02, 0.9, 0.05).unwrap();
/// let power = achieved_power(0.20, 0.02, n, 0.05).unwrap();
/// assert!(power >= 0.9);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn achieved_power(
    baseline: f64,
    mde: f64,
    n_per_group: u64,
    alpha: f64,
) -> Result<f64, StatsError> {
    let proportions = Proportions::new(baseline, mde)?;
    check_probability("alpha", alpha)?;
    if n_per_group == 0 {
        return Ok(0.0);
    }

    let normal = Normal::standard();
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z = (proportions.effect * (n_per_group as f64).sqrt() - z_alpha * proportions.null_sd)
        / proportions.alt_sd;
    Ok(normal.cdf(z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::cast_precision_loss)]
    fn ratio(a: u64, b: u64) -> f64 {
        a as f64 / b as f64
    }

    #[test]
    fn test_doubling_effect_quarters_sample_size() {
        for baseline in [0.05, 0.19, 0.45] {
            let n1 = required_sample_size(baseline, 0.01, 0.8, 0.05).unwrap();
            let n2 = required_sample_size(baseline, 0.02, 0.8, 0.05).unwrap();
            let r = ratio(n1, n2);
            assert!((3.5..4.5).contains(&r), "baseline={baseline}: ratio={r}");
        }
    }

    #[test]
    fn test_reference_sample_size() {
        // p1 = 0.20, p2 = 0.21, alpha = 0.05, power = 0.8 -> about 25,580 per group
        let n = required_sample_size(0.20, 0.01, 0.8, 0.05).unwrap();
        assert!((25_500..25_700).contains(&n), "n={n}");
    }

    #[test]
    fn test_stricter_requirements_need_more_users() {
        let base = required_sample_size(0.19, 0.01, 0.8, 0.05).unwrap();
        assert!(required_sample_size(0.19, 0.01, 0.9, 0.05).unwrap() > base);
        assert!(required_sample_size(0.19, 0.01, 0.8, 0.01).unwrap() > base);
    }

    #[test]
    fn test_achieved_power_grows_with_sample() {
        let small = achieved_power(0.19, -0.008, 5_000, 0.05).unwrap();
        let large = achieved_power(0.19, -0.008, 45_000, 0.05).unwrap();
        assert!(small < large);
        assert!(large > 0.8);
        assert_eq!(achieved_power(0.19, -0.008, 0, 0.05).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert_eq!(
            required_sample_size(0.19, 0.0, 0.8, 0.05),
            Err(StatsError::ZeroEffect)
        );
        assert!(matches!(
            required_sample_size(1.2, 0.01, 0.8, 0.05),
            Err(StatsError::ProbabilityOutOfRange {
                name: "baseline rate",
                ..
            })
        ));
        assert!(matches!(
            required_sample_size(0.995, 0.01, 0.8, 0.05),
            Err(StatsError::ProbabilityOutOfRange {
                name: "target rate",
                ..
            })
        ));
        assert!(matches!(
            required_sample_size(0.19, 0.01, 1.0, 0.05),
            Err(StatsError::ProbabilityOutOfRange { name: "power", .. })
        ));
        assert!(matches!(
            achieved_power(0.19, 0.01, 100, 0.0),
            Err(StatsError::ProbabilityOutOfRange { name: "alpha", .. })
        ));
    }
}
