//! labcalc-core: scientific calculators for teaching pharmacology and chemistry
//!
//! The centrepiece is probit analysis of quantal dose-response data
//! (LD50/ED50 with confidence interval and goodness-of-fit). Around it sit
//! closed-form pharmacokinetic and analytical chemistry calculators. Every
//! calculator is a pure function of its input.

pub mod calculator;
pub mod chemistry;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod pharmacokinetics;
pub mod toxicity;
pub mod transform;
pub mod types;

pub use calculator::{Calculation, CalculationOutput};
pub use errors::{CalcError, CalcResult};
pub use models::{fit_probit, ProbitLine};
pub use toxicity::ToxicityClass;
pub use types::*;
