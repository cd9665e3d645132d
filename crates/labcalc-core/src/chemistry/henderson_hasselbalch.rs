//! Henderson-Hasselbalch equation: pH = pKa + log10([A⁻]/[HA])

use crate::errors::{require_finite, require_positive, CalcResult};
use serde::{Deserialize, Serialize};

/// Whether the ionizable group is an acid (HA ⇌ A⁻) or a base (BH⁺ ⇌ B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ionizable {
    Acid,
    Base,
}

/// Buffer calculator input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solve_for", rename_all = "snake_case")]
pub enum BufferQuery {
    /// pH of a buffer from its conjugate base and acid concentrations
    Ph { pka: f64, base: f64, acid: f64 },
    /// [A⁻]/[HA] ratio needed for a target pH
    Ratio { pka: f64, ph: f64 },
    /// Ionized fraction of a compound at a pH
    IonizedFraction { kind: Ionizable, pka: f64, ph: f64 },
}

/// Buffer calculator output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solve_for", rename_all = "snake_case")]
pub enum BufferOutput {
    Ph { ph: f64 },
    Ratio { ratio: f64 },
    IonizedFraction { fraction: f64, percent: f64 },
}

impl BufferQuery {
    pub fn evaluate(&self) -> CalcResult<BufferOutput> {
        match *self {
            BufferQuery::Ph { pka, base, acid } => Ok(BufferOutput::Ph {
                ph: ph_from_ratio(pka, base, acid)?,
            }),
            BufferQuery::Ratio { pka, ph } => Ok(BufferOutput::Ratio {
                ratio: base_acid_ratio(pka, ph)?,
            }),
            BufferQuery::IonizedFraction { kind, pka, ph } => {
                let fraction = ionized_fraction(kind, pka, ph)?;
                Ok(BufferOutput::IonizedFraction {
                    fraction,
                    percent: fraction * 100.0,
                })
            }
        }
    }
}

/// pH = pKa + log10(base / acid)
pub fn ph_from_ratio(pka: f64, base: f64, acid: f64) -> CalcResult<f64> {
    let pka = require_finite("pka", pka)?;
    let base = require_positive("base", base)?;
    let acid = require_positive("acid", acid)?;
    Ok(pka + (base / acid).log10())
}

/// [A⁻]/[HA] = 10^(pH − pKa)
pub fn base_acid_ratio(pka: f64, ph: f64) -> CalcResult<f64> {
    let pka = require_finite("pka", pka)?;
    let ph = require_finite("ph", ph)?;
    Ok(10f64.powf(ph - pka))
}

/// Fraction of molecules in the ionized form
///
/// Acids ionize above their pKa, bases below it.
pub fn ionized_fraction(kind: Ionizable, pka: f64, ph: f64) -> CalcResult<f64> {
    let pka = require_finite("pka", pka)?;
    let ph = require_finite("ph", ph)?;
    let exponent = match kind {
        Ionizable::Acid => pka - ph,
        Ionizable::Base => ph - pka,
    };
    Ok(1.0 / (1.0 + 10f64.powf(exponent)))
}
