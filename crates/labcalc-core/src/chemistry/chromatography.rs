//! Thin-layer chromatography retention factor

use crate::errors::{require_non_negative, require_positive, CalcError, CalcResult};

/// Rf = distance travelled by the solute / distance travelled by the solvent front
pub fn retention_factor(solute_distance: f64, solvent_front: f64) -> CalcResult<f64> {
    let front = require_positive("solvent_front", solvent_front)?;
    let solute = require_non_negative("solute_distance", solute_distance)?;
    if solute > front {
        return Err(CalcError::invalid(
            "solute_distance",
            format!("{} exceeds the solvent front {}", solute, front),
        ));
    }
    Ok(solute / front)
}

/// Rf of every spot on one plate
pub fn retention_factors(solute_distances: &[f64], solvent_front: f64) -> CalcResult<Vec<f64>> {
    if solute_distances.is_empty() {
        return Err(CalcError::EmptyInput {
            field: "solute_distances",
        });
    }
    solute_distances
        .iter()
        .map(|&d| retention_factor(d, solvent_front))
        .collect()
}
