//! Pharmacokinetic exposure calculators
//!
//! Closed-form relations between dose, clearance and AUC, plus the
//! trapezoidal AUC of an observed concentration-time profile.

use crate::errors::{require_non_negative, require_positive, CalcError, CalcResult};
use serde::{Deserialize, Serialize};

/// Integration rule for the trapezoidal AUC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AucMethod {
    /// Linear trapezoid on every segment
    #[default]
    Linear,
    /// Linear while concentrations rise, logarithmic while they fall
    LinearUpLogDown,
}

/// Dose and exposure of one formulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub dose: f64,
    pub auc: f64,
}

/// Pharmacokinetic calculator input, one variant per widget mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PkScenario {
    /// One dose: AUC = F·dose / CL
    Single {
        dose: f64,
        clearance: f64,
        #[serde(default = "full_bioavailability")]
        bioavailability: f64,
    },
    /// Repeated dosing every `tau` at steady state
    Multiple {
        dose: f64,
        clearance: f64,
        #[serde(default = "full_bioavailability")]
        bioavailability: f64,
        tau: f64,
        half_life: f64,
    },
    /// Relative bioavailability of a test formulation against a reference
    Comparison { test: Exposure, reference: Exposure },
}

fn full_bioavailability() -> f64 {
    1.0
}

/// Pharmacokinetic calculator output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PkOutput {
    Single {
        auc: f64,
    },
    Multiple {
        /// AUC over one dosing interval at steady state
        auc_tau: f64,
        /// Average steady-state concentration AUCτ / τ
        average_concentration: f64,
        /// 1 / (1 − e^(−kτ))
        accumulation_factor: f64,
        elimination_rate: f64,
    },
    Comparison {
        /// (AUC_test / dose_test) / (AUC_ref / dose_ref)
        relative_bioavailability: f64,
        percent: f64,
    },
}

impl PkScenario {
    pub fn evaluate(&self) -> CalcResult<PkOutput> {
        match *self {
            PkScenario::Single {
                dose,
                clearance,
                bioavailability,
            } => Ok(PkOutput::Single {
                auc: auc_from_clearance(dose, clearance, bioavailability)?,
            }),
            PkScenario::Multiple {
                dose,
                clearance,
                bioavailability,
                tau,
                half_life: t_half,
            } => {
                let tau = require_positive("tau", tau)?;
                // At steady state AUC over one interval equals single-dose AUC to infinity
                let auc_tau = auc_from_clearance(dose, clearance, bioavailability)?;
                let k = elimination_rate(t_half)?;
                Ok(PkOutput::Multiple {
                    auc_tau,
                    average_concentration: auc_tau / tau,
                    accumulation_factor: 1.0 / (1.0 - (-k * tau).exp()),
                    elimination_rate: k,
                })
            }
            PkScenario::Comparison { test, reference } => {
                let ratio = relative_bioavailability(test, reference)?;
                Ok(PkOutput::Comparison {
                    relative_bioavailability: ratio,
                    percent: ratio * 100.0,
                })
            }
        }
    }
}

/// AUC from dose and clearance: F·dose / CL
pub fn auc_from_clearance(dose: f64, clearance: f64, bioavailability: f64) -> CalcResult<f64> {
    let dose = require_positive("dose", dose)?;
    let clearance = require_positive("clearance", clearance)?;
    let f = require_positive("bioavailability", bioavailability)?;
    if f > 1.0 {
        return Err(CalcError::invalid(
            "bioavailability",
            format!("{} (must be in (0, 1])", f),
        ));
    }
    Ok(f * dose / clearance)
}

/// First-order elimination rate constant: ln 2 / t½
pub fn elimination_rate(half_life: f64) -> CalcResult<f64> {
    Ok(std::f64::consts::LN_2 / require_positive("half_life", half_life)?)
}

/// Half-life from the elimination rate constant: ln 2 / k
pub fn half_life(elimination_rate: f64) -> CalcResult<f64> {
    Ok(std::f64::consts::LN_2 / require_positive("elimination_rate", elimination_rate)?)
}

/// AUC extrapolated to infinity: AUClast + Clast / k
pub fn auc_to_infinity(auc_last: f64, c_last: f64, elimination_rate: f64) -> CalcResult<f64> {
    let auc_last = require_non_negative("auc_last", auc_last)?;
    let c_last = require_non_negative("c_last", c_last)?;
    let k = require_positive("elimination_rate", elimination_rate)?;
    Ok(auc_last + c_last / k)
}

/// Relative bioavailability (dose-normalised AUC ratio)
pub fn relative_bioavailability(test: Exposure, reference: Exposure) -> CalcResult<f64> {
    let test_dose = require_positive("test.dose", test.dose)?;
    let test_auc = require_non_negative("test.auc", test.auc)?;
    let ref_dose = require_positive("reference.dose", reference.dose)?;
    let ref_auc = require_positive("reference.auc", reference.auc)?;
    Ok((test_auc / test_dose) / (ref_auc / ref_dose))
}

/// AUC of a concentration-time profile by the trapezoidal rule
///
/// # Arguments
/// * `times` - Sampling times, strictly increasing
/// * `concentrations` - Concentrations at those times, non-negative
/// * `method` - Integration rule
pub fn auc_trapezoidal(
    times: &[f64],
    concentrations: &[f64],
    method: AucMethod,
) -> CalcResult<f64> {
    if times.len() != concentrations.len() {
        return Err(CalcError::DimensionMismatch {
            left: "times",
            left_len: times.len(),
            right: "concentrations",
            right_len: concentrations.len(),
        });
    }
    if times.len() < 2 {
        return Err(CalcError::InsufficientData {
            valid: times.len(),
            required: 2,
        });
    }
    for &t in times {
        if !t.is_finite() {
            return Err(CalcError::invalid("times", format!("{} (must be finite)", t)));
        }
    }
    for &c in concentrations {
        require_non_negative("concentrations", c)?;
    }
    if times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CalcError::invalid("times", "must be strictly increasing"));
    }

    let auc = times
        .windows(2)
        .zip(concentrations.windows(2))
        .map(|(t, c)| {
            let dt = t[1] - t[0];
            let (c1, c2) = (c[0], c[1]);
            match method {
                AucMethod::LinearUpLogDown if c2 < c1 && c2 > 0.0 => {
                    (c1 - c2) * dt / (c1 / c2).ln()
                }
                _ => (c1 + c2) * dt / 2.0,
            }
        })
        .sum();

    Ok(auc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_from_clearance() {
        assert!((auc_from_clearance(500.0, 10.0, 1.0).unwrap() - 50.0).abs() < 1e-12);
        assert!((auc_from_clearance(500.0, 10.0, 0.5).unwrap() - 25.0).abs() < 1e-12);
        assert!(auc_from_clearance(500.0, 0.0, 1.0).is_err());
        assert!(auc_from_clearance(500.0, 10.0, 1.2).is_err());
    }

    #[test]
    fn test_half_life_round_trip() {
        let k = elimination_rate(6.0).unwrap();
        assert!((half_life(k).unwrap() - 6.0).abs() < 1e-12);
        assert!(elimination_rate(0.0).is_err());
    }

    #[test]
    fn test_linear_trapezoid_exact_for_lines() {
        let times = vec![0.0, 1.0, 3.0, 6.0];
        let conc: Vec<f64> = times.iter().map(|t| 10.0 - t).collect();
        // ∫0^6 (10 − t) dt = 60 − 18 = 42
        let auc = auc_trapezoidal(&times, &conc, AucMethod::Linear).unwrap();
        assert!((auc - 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_down_exact_for_exponential_decay() {
        let k: f64 = 0.3;
        let times = vec![0.0, 2.0, 4.0, 8.0];
        let conc: Vec<f64> = times.iter().map(|t| 100.0 * (-k * t).exp()).collect();
        let exact = 100.0 / k * (1.0 - (-k * 8.0).exp());

        let log_down = auc_trapezoidal(&times, &conc, AucMethod::LinearUpLogDown).unwrap();
        let linear = auc_trapezoidal(&times, &conc, AucMethod::Linear).unwrap();

        assert!((log_down - exact).abs() < 1e-9);
        assert!(linear > log_down);
    }

    #[test]
    fn test_trapezoid_validation() {
        assert!(matches!(
            auc_trapezoidal(&[0.0], &[1.0], AucMethod::Linear),
            Err(CalcError::InsufficientData { .. })
        ));
        assert!(matches!(
            auc_trapezoidal(&[0.0, 1.0], &[1.0], AucMethod::Linear),
            Err(CalcError::DimensionMismatch { .. })
        ));
        assert!(auc_trapezoidal(&[0.0, 0.0], &[1.0, 2.0], AucMethod::Linear).is_err());
        assert!(auc_trapezoidal(&[0.0, 1.0], &[1.0, -2.0], AucMethod::Linear).is_err());
    }

    #[test]
    fn test_auc_to_infinity() {
        assert!((auc_to_infinity(40.0, 2.0, 0.5).unwrap() - 44.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_dose_scenario() {
        let scenario = PkScenario::Multiple {
            dose: 100.0,
            clearance: 5.0,
            bioavailability: 1.0,
            tau: 12.0,
            half_life: 12.0,
        };
        match scenario.evaluate().unwrap() {
            PkOutput::Multiple {
                auc_tau,
                average_concentration,
                accumulation_factor,
                ..
            } => {
                assert!((auc_tau - 20.0).abs() < 1e-12);
                assert!((average_concentration - 20.0 / 12.0).abs() < 1e-12);
                // tau equal to the half-life doubles the exposure
                assert!((accumulation_factor - 2.0).abs() < 1e-12);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_comparison_scenario() {
        let scenario = PkScenario::Comparison {
            test: Exposure {
                dose: 200.0,
                auc: 90.0,
            },
            reference: Exposure {
                dose: 100.0,
                auc: 50.0,
            },
        };
        match scenario.evaluate().unwrap() {
            PkOutput::Comparison {
                relative_bioavailability,
                percent,
            } => {
                assert!((relative_bioavailability - 0.9).abs() < 1e-12);
                assert!((percent - 90.0).abs() < 1e-9);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_scenario_deserializes_with_mode_tag() {
        let scenario: PkScenario =
            serde_json::from_str(r#"{"mode": "single", "dose": 250, "clearance": 5}"#).unwrap();
        assert_eq!(
            scenario.evaluate().unwrap(),
            PkOutput::Single { auc: 50.0 }
        );
    }
}
