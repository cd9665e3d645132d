//! Analytical chemistry calculators

mod beer_lambert;
mod chromatography;
mod henderson_hasselbalch;

pub use beer_lambert::{
    absorbance_from_transmittance, transmittance_from_absorbance, BeerLambert, BeerLambertOutput,
};
pub use chromatography::{retention_factor, retention_factors};
pub use henderson_hasselbalch::{
    base_acid_ratio, ionized_fraction, ph_from_ratio, BufferQuery, BufferOutput, Ionizable,
};
