use serde::Serialize;

/// A two-sided interval around an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    /// Nominal coverage, e.g. `0.95`.
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Returns `true` if the interval lies entirely on one side of zero.
    ///
    /// ```
    /// # use gatecheck_stats::test_result::ConfidenceInterval;
    /// let ci = ConfidenceInterval { level: 0.95, lower: -0.013, upper: -0.003 };
    /// assert!(ci.excludes_zero());
    /// ```
    #[must_use]
    pub fn excludes_zero(&self) -> bool {
        self.lower > 0.0 || self.upper < 0.0
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Outcome of a statistical test or estimation stage.
///
/// Every stage of the analysis produces one of these; the report only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// The test statistic (chi-square value, U, mean difference, ...).
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Point estimate of the effect the test is about.
    pub effect_estimate: f64,
    /// Interval around `effect_estimate`, when the method provides one.
    pub confidence_interval: Option<ConfidenceInterval>,
}

impl TestResult {
    /// Whether the result is significant at the given alpha.
    ///
    /// ```
    /// # use gatecheck_stats::test_result::TestResult;
    /// let result = TestResult {
    ///     statistic: 3.2,
    ///     p_value: 0.001,
    ///     effect_estimate: -0.008,
    ///     confidence_interval: None,
    /// };
    /// assert!(result.is_significant(0.05));
    /// assert!(!result.is_significant(0.0005));
    /// ```
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
