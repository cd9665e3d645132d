//! Single entry point for every calculator widget
//!
//! A [`Calculation`] is the full input of one widget; evaluating it yields
//! the matching [`CalculationOutput`]. Both are tagged by `"calculator"` on
//! the wire.

use crate::chemistry::{
    retention_factors, BeerLambert, BeerLambertOutput, BufferOutput, BufferQuery,
};
use crate::errors::{require_positive, CalcResult};
use crate::models::fit_probit;
use crate::pharmacokinetics::{auc_trapezoidal, AucMethod, PkOutput, PkScenario};
use crate::toxicity::ToxicityClass;
use crate::types::{DoseResponseObservation, ProbitOptions, ProbitResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Calculator input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum Calculation {
    Probit {
        observations: Vec<DoseResponseObservation>,
        #[serde(default)]
        options: ProbitOptions,
    },
    ToxicityClass {
        ld50: f64,
    },
    Pharmacokinetics {
        scenario: PkScenario,
    },
    AucProfile {
        times: Vec<f64>,
        concentrations: Vec<f64>,
        #[serde(default)]
        method: AucMethod,
    },
    BeerLambert {
        problem: BeerLambert,
    },
    HendersonHasselbalch {
        query: BufferQuery,
    },
    RetentionFactor {
        solvent_front: f64,
        solute_distances: Vec<f64>,
    },
}

/// Calculator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum CalculationOutput {
    Probit(ProbitResult),
    ToxicityClass {
        class: ToxicityClass,
        label: String,
    },
    Pharmacokinetics {
        result: PkOutput,
    },
    AucProfile {
        auc: f64,
    },
    BeerLambert(BeerLambertOutput),
    HendersonHasselbalch {
        result: BufferOutput,
    },
    RetentionFactor {
        values: Vec<f64>,
    },
}

impl Calculation {
    /// Wire name of the calculator
    pub fn name(&self) -> &'static str {
        match self {
            Calculation::Probit { .. } => "probit",
            Calculation::ToxicityClass { .. } => "toxicity_class",
            Calculation::Pharmacokinetics { .. } => "pharmacokinetics",
            Calculation::AucProfile { .. } => "auc_profile",
            Calculation::BeerLambert { .. } => "beer_lambert",
            Calculation::HendersonHasselbalch { .. } => "henderson_hasselbalch",
            Calculation::RetentionFactor { .. } => "retention_factor",
        }
    }

    #[tracing::instrument(skip_all, fields(calculator = self.name()))]
    pub fn evaluate(&self) -> CalcResult<CalculationOutput> {
        let output = match self {
            Calculation::Probit {
                observations,
                options,
            } => CalculationOutput::Probit(fit_probit(observations, options)?),
            Calculation::ToxicityClass { ld50 } => {
                let class = ToxicityClass::from_ld50(require_positive("ld50", *ld50)?);
                CalculationOutput::ToxicityClass {
                    class,
                    label: class.label().to_string(),
                }
            }
            Calculation::Pharmacokinetics { scenario } => CalculationOutput::Pharmacokinetics {
                result: scenario.evaluate()?,
            },
            Calculation::AucProfile {
                times,
                concentrations,
                method,
            } => CalculationOutput::AucProfile {
                auc: auc_trapezoidal(times, concentrations, *method)?,
            },
            Calculation::BeerLambert { problem } => {
                CalculationOutput::BeerLambert(problem.solve()?)
            }
            Calculation::HendersonHasselbalch { query } => {
                CalculationOutput::HendersonHasselbalch {
                    result: query.evaluate()?,
                }
            }
            Calculation::RetentionFactor {
                solvent_front,
                solute_distances,
            } => CalculationOutput::RetentionFactor {
                values: retention_factors(solute_distances, *solvent_front)?,
            },
        };
        debug!("calculation finished");
        Ok(output)
    }
}
