//! Regression models

mod probit;
mod wls;

pub use probit::{fit_probit, ProbitLine};
pub use wls::{fit_weighted_line, WeightedLine, MIN_OBSERVATIONS};
