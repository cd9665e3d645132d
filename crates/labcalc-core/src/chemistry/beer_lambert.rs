//! Beer-Lambert law: A = ε·l·c

use crate::errors::{require_non_negative, require_positive, CalcError, CalcResult};
use serde::{Deserialize, Serialize};

/// Beer-Lambert problem, named by the unknown being solved for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solve_for", rename_all = "snake_case")]
pub enum BeerLambert {
    Absorbance {
        /// Molar absorptivity ε (L·mol⁻¹·cm⁻¹)
        molar_absorptivity: f64,
        /// Path length l (cm)
        path_length: f64,
        /// Concentration c (mol/L)
        concentration: f64,
    },
    Concentration {
        absorbance: f64,
        molar_absorptivity: f64,
        path_length: f64,
    },
    MolarAbsorptivity {
        absorbance: f64,
        path_length: f64,
        concentration: f64,
    },
    PathLength {
        absorbance: f64,
        molar_absorptivity: f64,
        concentration: f64,
    },
}

/// Solved Beer-Lambert quantities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeerLambertOutput {
    pub absorbance: f64,
    pub molar_absorptivity: f64,
    pub path_length: f64,
    pub concentration: f64,
    /// Fraction of light transmitted, 10^(−A)
    pub transmittance: f64,
}

impl BeerLambert {
    pub fn solve(&self) -> CalcResult<BeerLambertOutput> {
        let (a, eps, l, c) = match *self {
            BeerLambert::Absorbance {
                molar_absorptivity,
                path_length,
                concentration,
            } => {
                let eps = require_positive("molar_absorptivity", molar_absorptivity)?;
                let l = require_positive("path_length", path_length)?;
                let c = require_non_negative("concentration", concentration)?;
                (eps * l * c, eps, l, c)
            }
            BeerLambert::Concentration {
                absorbance,
                molar_absorptivity,
                path_length,
            } => {
                let a = require_non_negative("absorbance", absorbance)?;
                let eps = require_positive("molar_absorptivity", molar_absorptivity)?;
                let l = require_positive("path_length", path_length)?;
                (a, eps, l, a / (eps * l))
            }
            BeerLambert::MolarAbsorptivity {
                absorbance,
                path_length,
                concentration,
            } => {
                let a = require_non_negative("absorbance", absorbance)?;
                let l = require_positive("path_length", path_length)?;
                let c = require_positive("concentration", concentration)?;
                (a, a / (l * c), l, c)
            }
            BeerLambert::PathLength {
                absorbance,
                molar_absorptivity,
                concentration,
            } => {
                let a = require_non_negative("absorbance", absorbance)?;
                let eps = require_positive("molar_absorptivity", molar_absorptivity)?;
                let c = require_positive("concentration", concentration)?;
                (a, eps, a / (eps * c), c)
            }
        };

        Ok(BeerLambertOutput {
            absorbance: a,
            molar_absorptivity: eps,
            path_length: l,
            concentration: c,
            transmittance: transmittance_from_absorbance(a)?,
        })
    }
}

/// A = −log10(T), T in (0, 1]
pub fn absorbance_from_transmittance(transmittance: f64) -> CalcResult<f64> {
    if !(transmittance > 0.0 && transmittance <= 1.0) {
        return Err(CalcError::invalid(
            "transmittance",
            format!("{} (must be in (0, 1])", transmittance),
        ));
    }
    Ok(-transmittance.log10())
}

/// T = 10^(−A), A ≥ 0
pub fn transmittance_from_absorbance(absorbance: f64) -> CalcResult<f64> {
    let a = require_non_negative("absorbance", absorbance)?;
    Ok(10f64.powf(-a))
}
