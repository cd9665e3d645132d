//! Probit analysis of quantal dose-response data
//!
//! Observed response proportions are converted to probits and regressed on
//! log10(dose) by weighted least squares with weights n·p·(1 − p). The dose
//! at probit 5 is the median effective (or lethal) dose.

use crate::diagnostics::binomial_chi_square;
use crate::errors::{require_positive, CalcError, CalcResult};
use crate::models::wls::{fit_weighted_line, WeightedLine};
use crate::toxicity::ToxicityClass;
use crate::transform::{normal_quantile, probit, probit_to_proportion, PROBIT_OFFSET};
use crate::types::{
    BackTransform, ConfidenceInterval, CriticalValue, DoseResponseObservation,
    ExtremeResponsePolicy, ProbitOptions, ProbitResult, ProbitRow,
};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, warn};

/// Slopes smaller than this in magnitude are treated as zero
const MIN_SLOPE: f64 = 1e-12;

/// Fitted probit line: probit = intercept + slope·log10(dose)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbitLine {
    pub intercept: f64,
    pub slope: f64,
}

impl ProbitLine {
    pub fn new(intercept: f64, slope: f64) -> Self {
        Self { intercept, slope }
    }

    /// Probit predicted at a dose
    pub fn probit_at(&self, dose: f64) -> f64 {
        self.intercept + self.slope * dose.log10()
    }

    /// Response proportion predicted at a dose
    pub fn expected_proportion(&self, dose: f64, transform: BackTransform) -> f64 {
        probit_to_proportion(self.probit_at(dose), transform)
    }

    /// log10(dose) at which the line reaches a probit value
    pub fn log_dose_at_probit(&self, target: f64) -> CalcResult<f64> {
        if !self.slope.is_finite() || self.slope.abs() < MIN_SLOPE {
            return Err(CalcError::ZeroSlope);
        }
        Ok((target - self.intercept) / self.slope)
    }

    /// Dose producing a given response percentage (ED10, ED50, ED90, ...)
    pub fn dose_at(&self, response_percent: f64) -> CalcResult<f64> {
        let target = probit(response_percent / 100.0)?;
        dose_from_log("dose", self.log_dose_at_probit(target)?)
    }

    /// Dose producing a 50% response
    pub fn median_dose(&self) -> CalcResult<f64> {
        dose_from_log("ld50", self.log_dose_at_probit(PROBIT_OFFSET)?)
    }
}

/// 10^log_dose, rejecting results that overflow or underflow to zero
fn dose_from_log(quantity: &'static str, log_dose: f64) -> CalcResult<f64> {
    let dose = 10f64.powf(log_dose);
    if !dose.is_finite() || dose <= 0.0 {
        return Err(CalcError::DoseOutOfRange {
            quantity,
            log10_value: log_dose,
        });
    }
    Ok(dose)
}

impl ProbitResult {
    /// The fitted line
    pub fn line(&self) -> ProbitLine {
        ProbitLine::new(self.intercept, self.slope)
    }
}

/// A row that survived validation and extreme-response handling
struct PreparedRow {
    dose: f64,
    proportion: f64,
    sample_size: u32,
}

/// Run a probit analysis and estimate the LD50
///
/// # Arguments
/// * `observations` - Dose-response rows in any order
/// * `options` - Analysis options
///
/// # Errors
/// * `InvalidValue` for a non-positive dose, a response outside [0, 100] or a
///   zero sample size
/// * `ProbabilityOutOfRange` for 0% or 100% rows under `ExtremeResponsePolicy::Reject`
/// * `InsufficientData` when fewer than three rows remain
/// * `DegenerateRegression` when all remaining doses are equal
/// * `ZeroSlope` when the fitted response does not change with dose
/// * `DoseOutOfRange` when the LD50 or an interval bound overflows or underflows
#[tracing::instrument(skip_all, fields(n_rows = observations.len()))]
pub fn fit_probit(
    observations: &[DoseResponseObservation],
    options: &ProbitOptions,
) -> CalcResult<ProbitResult> {
    validate_options(options)?;

    if observations.is_empty() {
        return Err(CalcError::EmptyInput {
            field: "observations",
        });
    }

    let (rows, n_excluded) = prepare_rows(observations, options.extreme_responses)?;

    let log_doses: Vec<f64> = rows.iter().map(|r| r.dose.log10()).collect();
    let probits: Vec<f64> = rows
        .iter()
        .map(|r| probit(r.proportion))
        .collect::<CalcResult<_>>()?;
    let weights: Vec<f64> = rows
        .iter()
        .map(|r| r.sample_size as f64 * r.proportion * (1.0 - r.proportion))
        .collect();

    let fit = fit_weighted_line(&log_doses, &probits, &weights)?;
    let line = ProbitLine::new(fit.intercept, fit.slope);

    let log_ld50 = line.log_dose_at_probit(PROBIT_OFFSET)?;
    let ld50 = dose_from_log("ld50", log_ld50)?;

    let log_ld50_std_error = log_median_std_error(&fit, log_ld50);
    let critical = critical_value(options, fit.n_observations)?;
    let confidence_interval = ConfidenceInterval {
        lower: dose_from_log("ld50 lower bound", log_ld50 - critical * log_ld50_std_error)?,
        upper: dose_from_log("ld50 upper bound", log_ld50 + critical * log_ld50_std_error)?,
        level: options.confidence_level,
    };

    let observed: Vec<f64> = rows.iter().map(|r| r.proportion).collect();
    let expected: Vec<f64> = rows
        .iter()
        .map(|r| line.expected_proportion(r.dose, options.back_transform))
        .collect();
    let sample_sizes: Vec<u32> = rows.iter().map(|r| r.sample_size).collect();
    let gof = binomial_chi_square(&observed, &expected, &sample_sizes, 2)?;

    if !gof.adequate {
        warn!(
            chi_square = gof.statistic,
            critical = gof.critical,
            df = gof.df,
            "probit line fits poorly; LD50 interval is optimistic"
        );
    }

    let classification = ToxicityClass::from_ld50(ld50);
    debug!(
        intercept = fit.intercept,
        slope = fit.slope,
        ld50,
        %classification,
        "probit fit complete"
    );

    let table = rows
        .iter()
        .enumerate()
        .map(|(i, r)| ProbitRow {
            dose: r.dose,
            log_dose: log_doses[i],
            observed: r.proportion,
            probit: probits[i],
            weight: weights[i],
            sample_size: r.sample_size,
            expected: expected[i],
            chi_square: gof.contributions[i],
        })
        .collect();

    Ok(ProbitResult {
        intercept: fit.intercept,
        slope: fit.slope,
        ld50,
        log_ld50,
        log_ld50_std_error,
        confidence_interval,
        chi_square: gof.statistic,
        degrees_of_freedom: gof.df,
        chi_square_critical: gof.critical,
        chi_square_p_value: gof.p_value,
        adequate_fit: gof.adequate,
        heterogeneity: gof.heterogeneity,
        classification,
        n_observations: fit.n_observations,
        n_excluded,
        rows: table,
    })
}

fn validate_options(options: &ProbitOptions) -> CalcResult<()> {
    let level = options.confidence_level;
    if !(level > 0.0 && level < 1.0) {
        return Err(CalcError::InvalidConfidenceLevel(level));
    }
    if let CriticalValue::Fixed(c) = options.critical_value {
        require_positive("critical_value", c)?;
    }
    Ok(())
}

/// Validate, sort by dose and apply the extreme-response policy
fn prepare_rows(
    observations: &[DoseResponseObservation],
    policy: ExtremeResponsePolicy,
) -> CalcResult<(Vec<PreparedRow>, usize)> {
    let mut sorted: Vec<&DoseResponseObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        // Blank form rows
        if !obs.dose.is_finite() || !obs.response_percent.is_finite() {
            debug!(dose = obs.dose, response = obs.response_percent, "skipping blank row");
            continue;
        }
        require_positive("dose", obs.dose)?;
        if !(0.0..=100.0).contains(&obs.response_percent) {
            return Err(CalcError::invalid(
                "response_percent",
                format!("{} (must be in [0, 100])", obs.response_percent),
            ));
        }
        if obs.sample_size == 0 {
            return Err(CalcError::invalid("sample_size", "must be at least 1"));
        }
        sorted.push(obs);
    }
    sorted.sort_by(|a, b| a.dose.total_cmp(&b.dose));

    let mut rows = Vec::with_capacity(sorted.len());
    let mut n_excluded = 0;
    for obs in sorted {
        let n = obs.sample_size as f64;
        let mut p = obs.response_percent / 100.0;
        if p <= 0.0 || p >= 1.0 {
            match policy {
                ExtremeResponsePolicy::Exclude => {
                    debug!(dose = obs.dose, p, "excluding extreme response");
                    n_excluded += 1;
                    continue;
                }
                ExtremeResponsePolicy::Correct => {
                    p = if p <= 0.0 { 0.25 / n } else { (n - 0.25) / n };
                }
                ExtremeResponsePolicy::Reject => {
                    return Err(CalcError::ProbabilityOutOfRange(p));
                }
            }
        }
        rows.push(PreparedRow {
            dose: obs.dose,
            proportion: p,
            sample_size: obs.sample_size,
        });
    }

    Ok((rows, n_excluded))
}

/// Delta-method standard error of log10(LD50)
///
/// var(m) ≈ s²/b² · (1/Σw + (m − x̄)²/Sxx)
fn log_median_std_error(fit: &WeightedLine, log_median: f64) -> f64 {
    let s2 = fit.residual_variance();
    let var = s2 / (fit.slope * fit.slope)
        * (1.0 / fit.sum_weights + (log_median - fit.x_mean).powi(2) / fit.sxx);
    var.max(0.0).sqrt()
}

fn critical_value(options: &ProbitOptions, n_observations: usize) -> CalcResult<f64> {
    let upper = (1.0 + options.confidence_level) / 2.0;
    match options.critical_value {
        CriticalValue::Fixed(c) => Ok(c),
        CriticalValue::Normal => normal_quantile(upper),
        CriticalValue::StudentT => {
            let df = n_observations.saturating_sub(2).max(1) as f64;
            let dist = StudentsT::new(0.0, 1.0, df)
                .map_err(|e| CalcError::Distribution(e.to_string()))?;
            Ok(dist.inverse_cdf(upper))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_observations() -> Vec<DoseResponseObservation> {
        [50.0, 100.0, 200.0, 400.0, 800.0]
            .iter()
            .zip([0.0, 10.0, 40.0, 70.0, 90.0])
            .map(|(&dose, response)| DoseResponseObservation::new(dose, response, 10))
            .collect()
    }

    #[test]
    fn test_probit_reference_experiment() {
        let result = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();

        assert!(result.ld50.is_finite());
        assert!(result.ld50 > 100.0 && result.ld50 < 400.0, "ld50={}", result.ld50);
        assert!(result.chi_square >= 0.0);
        assert!(result.slope > 0.0);
        assert_eq!(result.n_observations, 4);
        assert_eq!(result.n_excluded, 1);
        assert_eq!(result.degrees_of_freedom, 2);
        assert_eq!(result.classification, ToxicityClass::ModeratelyToxic);
        assert!(result.confidence_interval.contains(result.ld50));
    }

    #[test]
    fn test_ld50_reproduces_probit_five() {
        let result = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let back = result.line().probit_at(result.ld50);
        assert!((back - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_sorted_by_dose() {
        let mut obs = reference_observations();
        obs.reverse();
        let result = fit_probit(&obs, &ProbitOptions::default()).unwrap();
        let doses: Vec<f64> = result.rows.iter().map(|r| r.dose).collect();
        assert_eq!(doses, vec![100.0, 200.0, 400.0, 800.0]);

        let forward = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        assert!((forward.ld50 - result.ld50).abs() < 1e-9);
    }

    #[test]
    fn test_exact_probit_line_recovered() {
        // Responses generated from probit = -1 + 3·log10(dose)
        let line = ProbitLine::new(-1.0, 3.0);
        let obs: Vec<DoseResponseObservation> = [20.0, 50.0, 100.0, 200.0, 500.0]
            .iter()
            .map(|&d| {
                let p = line.expected_proportion(d, BackTransform::Normal);
                DoseResponseObservation::new(d, p * 100.0, 40)
            })
            .collect();

        let result = fit_probit(&obs, &ProbitOptions::default()).unwrap();

        assert!((result.slope - 3.0).abs() < 1e-6);
        assert!((result.intercept + 1.0).abs() < 1e-6);
        assert!((result.ld50 - 100.0).abs() < 1e-3);
        assert!(result.chi_square < 1e-8);
        assert!(result.adequate_fit);
    }

    #[test]
    fn test_dose_at_levels_are_ordered() {
        let result = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let line = result.line();
        let ed10 = line.dose_at(10.0).unwrap();
        let ed50 = line.dose_at(50.0).unwrap();
        let ed90 = line.dose_at(90.0).unwrap();
        assert!(ed10 < ed50 && ed50 < ed90);
        assert!((ed50 - result.ld50).abs() < 1e-6);
        assert!((line.median_dose().unwrap() - result.ld50).abs() < 1e-9);
    }

    #[test]
    fn test_two_valid_rows_is_insufficient() {
        let obs = vec![
            DoseResponseObservation::new(10.0, 20.0, 10),
            DoseResponseObservation::new(20.0, 60.0, 10),
        ];
        let result = fit_probit(&obs, &ProbitOptions::default());
        assert!(matches!(
            result,
            Err(CalcError::InsufficientData { valid: 2, .. })
        ));
    }

    #[test]
    fn test_excluded_rows_do_not_count() {
        let obs = vec![
            DoseResponseObservation::new(10.0, 0.0, 10),
            DoseResponseObservation::new(20.0, 30.0, 10),
            DoseResponseObservation::new(40.0, 70.0, 10),
            DoseResponseObservation::new(80.0, 100.0, 10),
        ];
        let result = fit_probit(&obs, &ProbitOptions::default());
        assert!(matches!(result, Err(CalcError::InsufficientData { .. })));

        let options = ProbitOptions {
            extreme_responses: ExtremeResponsePolicy::Correct,
            ..Default::default()
        };
        let corrected = fit_probit(&obs, &options).unwrap();
        assert_eq!(corrected.n_observations, 4);
        assert_eq!(corrected.n_excluded, 0);
        assert!((corrected.rows[0].observed - 0.025).abs() < 1e-12);
        assert!((corrected.rows[3].observed - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_reject_policy() {
        let options = ProbitOptions {
            extreme_responses: ExtremeResponsePolicy::Reject,
            ..Default::default()
        };
        let result = fit_probit(&reference_observations(), &options);
        assert!(matches!(result, Err(CalcError::ProbabilityOutOfRange(_))));
    }

    #[test]
    fn test_equal_doses_are_degenerate() {
        let obs = vec![
            DoseResponseObservation::new(100.0, 20.0, 10),
            DoseResponseObservation::new(100.0, 40.0, 10),
            DoseResponseObservation::new(100.0, 60.0, 10),
        ];
        let result = fit_probit(&obs, &ProbitOptions::default());
        assert!(matches!(result, Err(CalcError::DegenerateRegression)));
    }

    #[test]
    fn test_flat_response_has_zero_slope() {
        let obs = vec![
            DoseResponseObservation::new(10.0, 50.0, 10),
            DoseResponseObservation::new(100.0, 50.0, 10),
            DoseResponseObservation::new(1000.0, 50.0, 10),
        ];
        let result = fit_probit(&obs, &ProbitOptions::default());
        assert!(matches!(result, Err(CalcError::ZeroSlope)));
    }

    #[test]
    fn test_nearly_flat_response_is_out_of_range() {
        let rising = vec![
            DoseResponseObservation::new(10.0, 40.0, 10),
            DoseResponseObservation::new(100.0, 40.0, 10),
            DoseResponseObservation::new(1000.0, 40.0001, 10),
        ];
        assert!(matches!(
            fit_probit(&rising, &ProbitOptions::default()),
            Err(CalcError::DoseOutOfRange { quantity: "ld50", .. })
        ));

        let falling = vec![
            DoseResponseObservation::new(10.0, 40.0001, 10),
            DoseResponseObservation::new(100.0, 40.0, 10),
            DoseResponseObservation::new(1000.0, 40.0, 10),
        ];
        assert!(matches!(
            fit_probit(&falling, &ProbitOptions::default()),
            Err(CalcError::DoseOutOfRange { .. })
        ));
    }

    #[test]
    fn test_dose_at_rejects_overflow() {
        let line = ProbitLine::new(5.0 - 1e-6 * 400.0, 1e-6);
        assert!(matches!(
            line.median_dose(),
            Err(CalcError::DoseOutOfRange { .. })
        ));
        assert!((ProbitLine::new(3.0, 1.0).median_dose().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let bad_dose = vec![DoseResponseObservation::new(-1.0, 50.0, 10)];
        assert!(matches!(
            fit_probit(&bad_dose, &ProbitOptions::default()),
            Err(CalcError::InvalidValue { field: "dose", .. })
        ));

        let bad_response = vec![DoseResponseObservation::new(1.0, 120.0, 10)];
        assert!(matches!(
            fit_probit(&bad_response, &ProbitOptions::default()),
            Err(CalcError::InvalidValue {
                field: "response_percent",
                ..
            })
        ));

        let bad_n = vec![DoseResponseObservation::new(1.0, 20.0, 0)];
        assert!(matches!(
            fit_probit(&bad_n, &ProbitOptions::default()),
            Err(CalcError::InvalidValue {
                field: "sample_size",
                ..
            })
        ));

        assert!(matches!(
            fit_probit(&[], &ProbitOptions::default()),
            Err(CalcError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let mut obs = reference_observations();
        obs.push(DoseResponseObservation::new(f64::NAN, f64::NAN, 10));
        let result = fit_probit(&obs, &ProbitOptions::default()).unwrap();
        assert_eq!(result.n_observations, 4);
    }

    #[test]
    fn test_invalid_confidence_level() {
        let options = ProbitOptions {
            confidence_level: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            fit_probit(&reference_observations(), &options),
            Err(CalcError::InvalidConfidenceLevel(_))
        ));
    }

    #[test]
    fn test_student_t_interval_is_wider_than_fixed() {
        let fixed = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let t_options = ProbitOptions {
            critical_value: CriticalValue::StudentT,
            ..Default::default()
        };
        let student = fit_probit(&reference_observations(), &t_options).unwrap();

        assert_eq!(fixed.ld50, student.ld50);
        assert!(student.confidence_interval.lower <= fixed.confidence_interval.lower);
        assert!(student.confidence_interval.upper >= fixed.confidence_interval.upper);
    }

    #[test]
    fn test_normal_critical_matches_fixed_at_95() {
        let normal_options = ProbitOptions {
            critical_value: CriticalValue::Normal,
            ..Default::default()
        };
        let fixed = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let normal = fit_probit(&reference_observations(), &normal_options).unwrap();
        let rel = (normal.confidence_interval.upper - fixed.confidence_interval.upper).abs()
            / fixed.confidence_interval.upper;
        assert!(rel < 1e-3);
    }

    #[test]
    fn test_logistic_back_transform_only_changes_fit_statistics() {
        let options = ProbitOptions {
            back_transform: BackTransform::Logistic,
            ..Default::default()
        };
        let normal = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let logistic = fit_probit(&reference_observations(), &options).unwrap();
        assert_eq!(normal.ld50, logistic.ld50);
        assert_eq!(normal.slope, logistic.slope);
        assert!(logistic.chi_square >= 0.0);
    }

    #[test]
    fn test_repeatable() {
        let a = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        let b = fit_probit(&reference_observations(), &ProbitOptions::default()).unwrap();
        assert_eq!(a, b);
    }
}
