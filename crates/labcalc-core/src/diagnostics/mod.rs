//! Diagnostic functions for fitted models

mod goodness_of_fit;

pub use goodness_of_fit::{
    binomial_chi_square, chi_square_critical, chi_square_p_value, ChiSquareFit,
};
