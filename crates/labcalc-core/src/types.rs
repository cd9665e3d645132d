use serde::{Deserialize, Deserializer, Serialize};

use crate::toxicity::ToxicityClass;

// ============================================================================
// Probit Analysis Types
// ============================================================================

/// One row of a dose-response experiment
///
/// On the wire a blank field is `null` or absent; blank doses and responses
/// become NaN and the row is skipped by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseResponseObservation {
    /// Administered dose (e.g. mg/kg), must be positive
    #[serde(default = "blank_value", deserialize_with = "value_or_blank")]
    pub dose: f64,
    /// Percentage of subjects responding, in [0, 100]
    #[serde(default = "blank_value", deserialize_with = "value_or_blank")]
    pub response_percent: f64,
    /// Number of subjects exposed at this dose
    #[serde(default, deserialize_with = "count_or_zero")]
    pub sample_size: u32,
}

fn blank_value() -> f64 {
    f64::NAN
}

fn value_or_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn count_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

impl DoseResponseObservation {
    pub fn new(dose: f64, response_percent: f64, sample_size: u32) -> Self {
        Self {
            dose,
            response_percent,
            sample_size,
        }
    }
}

/// How rows with a 0% or 100% response are treated before the probit transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeResponsePolicy {
    /// Drop the row; it does not count toward the minimum row count (default)
    #[default]
    Exclude,
    /// Replace 0% by 0.25/n and 100% by (n - 0.25)/n
    Correct,
    /// Fail with a numeric-domain error
    Reject,
}

/// Mapping from a probit value back to a proportion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackTransform {
    /// Standard normal CDF, consistent with the probit fit (default)
    #[default]
    Normal,
    /// Logistic approximation 1 / (1 + exp(-1.702 (y - 5)))
    Logistic,
}

/// Source of the critical value used for the LD50 confidence interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalValue {
    /// A fixed multiplier, independent of the confidence level
    Fixed(f64),
    /// Standard normal quantile for the confidence level
    Normal,
    /// Student t quantile for the confidence level with k - 2 degrees of freedom
    StudentT,
}

impl Default for CriticalValue {
    fn default() -> Self {
        CriticalValue::Fixed(1.96)
    }
}

/// Options for probit analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbitOptions {
    /// Treatment of 0% and 100% response rows
    pub extreme_responses: ExtremeResponsePolicy,
    /// Back-transform used for the goodness-of-fit expected proportions
    pub back_transform: BackTransform,
    /// Critical value for the LD50 confidence interval
    pub critical_value: CriticalValue,
    /// Confidence level for the interval (default: 0.95)
    pub confidence_level: f64,
}

impl Default for ProbitOptions {
    fn default() -> Self {
        Self {
            extreme_responses: ExtremeResponsePolicy::Exclude,
            back_transform: BackTransform::Normal,
            critical_value: CriticalValue::default(),
            confidence_level: 0.95,
        }
    }
}

/// Two-sided confidence interval on the dose scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Confidence level the interval was requested at
    pub level: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Working-table row for one observation used in the fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbitRow {
    pub dose: f64,
    /// log10(dose)
    pub log_dose: f64,
    /// Observed proportion after extreme-response handling
    pub observed: f64,
    /// Probit of the observed proportion
    pub probit: f64,
    /// Regression weight n·p·(1 − p)
    pub weight: f64,
    pub sample_size: u32,
    /// Proportion predicted by the fitted line
    pub expected: f64,
    /// Contribution of this row to the chi-square statistic
    pub chi_square: f64,
}

/// Result of a probit dose-response analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbitResult {
    /// Intercept `a` of probit = a + b·log10(dose)
    pub intercept: f64,
    /// Slope `b` of probit = a + b·log10(dose)
    pub slope: f64,
    /// Dose producing a 50% response
    pub ld50: f64,
    /// log10 of the LD50
    pub log_ld50: f64,
    /// Standard error of log10(LD50)
    pub log_ld50_std_error: f64,
    pub confidence_interval: ConfidenceInterval,
    /// Goodness-of-fit chi-square statistic
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    /// Tabulated 95% critical value for the degrees of freedom
    pub chi_square_critical: f64,
    /// Upper-tail p-value of the chi-square statistic
    pub chi_square_p_value: f64,
    /// Whether the chi-square statistic is below its critical value
    pub adequate_fit: bool,
    /// Heterogeneity factor chi-square / df
    pub heterogeneity: f64,
    pub classification: ToxicityClass,
    /// Rows used in the regression
    pub n_observations: usize,
    /// Rows dropped by the extreme-response policy
    pub n_excluded: usize,
    /// Working table sorted by dose
    pub rows: Vec<ProbitRow>,
}
