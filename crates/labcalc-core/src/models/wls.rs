//! Weighted Least Squares (WLS) fit of a straight line
//!
//! Solves the weighted normal equations in closed form:
//! b = Sxy / Sxx and a = ȳ − b·x̄, where the means and sums of squares are
//! weighted.

use crate::errors::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};

/// Fewest rows a straight-line fit with a residual variance can use
pub const MIN_OBSERVATIONS: usize = 3;

/// Fitted line y = intercept + slope·x with the sums needed for inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedLine {
    pub intercept: f64,
    pub slope: f64,
    /// Σw
    pub sum_weights: f64,
    /// Weighted mean of x
    pub x_mean: f64,
    /// Weighted mean of y
    pub y_mean: f64,
    /// Σw(x − x̄)²
    pub sxx: f64,
    /// Σw(x − x̄)(y − ȳ)
    pub sxy: f64,
    /// Σw(y − ŷ)²
    pub weighted_rss: f64,
    /// Number of observations used
    pub n_observations: usize,
}

impl WeightedLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Residual variance s² = Σw(y − ŷ)² / (n − 2)
    pub fn residual_variance(&self) -> f64 {
        let df = self.n_observations.saturating_sub(2);
        if df == 0 {
            return 0.0;
        }
        self.weighted_rss / df as f64
    }
}

/// Fit a weighted straight line
///
/// # Arguments
/// * `x` - Independent variable
/// * `y` - Dependent variable
/// * `weights` - Observation weights (rows with non-positive weights are skipped)
///
/// # Errors
/// * `InsufficientData` when fewer than three rows are usable
/// * `DegenerateRegression` when every usable x is the same
pub fn fit_weighted_line(x: &[f64], y: &[f64], weights: &[f64]) -> CalcResult<WeightedLine> {
    if x.is_empty() {
        return Err(CalcError::EmptyInput { field: "x" });
    }
    if y.len() != x.len() {
        return Err(CalcError::DimensionMismatch {
            left: "x",
            left_len: x.len(),
            right: "y",
            right_len: y.len(),
        });
    }
    if weights.len() != x.len() {
        return Err(CalcError::DimensionMismatch {
            left: "x",
            left_len: x.len(),
            right: "weights",
            right_len: weights.len(),
        });
    }

    // Filter out rows with NaN/Inf values or non-positive weights
    let valid_indices: Vec<usize> = (0..x.len())
        .filter(|&i| {
            x[i].is_finite() && y[i].is_finite() && weights[i].is_finite() && weights[i] > 0.0
        })
        .collect();

    let n_valid = valid_indices.len();
    if n_valid < MIN_OBSERVATIONS {
        return Err(CalcError::InsufficientData {
            valid: n_valid,
            required: MIN_OBSERVATIONS,
        });
    }

    let first_x = x[valid_indices[0]];
    if valid_indices
        .iter()
        .all(|&i| (x[i] - first_x).abs() < 1e-10)
    {
        return Err(CalcError::DegenerateRegression);
    }

    let sum_w: f64 = valid_indices.iter().map(|&i| weights[i]).sum();
    let x_mean = valid_indices.iter().map(|&i| weights[i] * x[i]).sum::<f64>() / sum_w;
    let y_mean = valid_indices.iter().map(|&i| weights[i] * y[i]).sum::<f64>() / sum_w;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &i in valid_indices.iter() {
        let dx = x[i] - x_mean;
        sxx += weights[i] * dx * dx;
        sxy += weights[i] * dx * (y[i] - y_mean);
    }

    if sxx <= 0.0 || !sxx.is_finite() {
        return Err(CalcError::DegenerateRegression);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let weighted_rss: f64 = valid_indices
        .iter()
        .map(|&i| weights[i] * (y[i] - intercept - slope * x[i]).powi(2))
        .sum();

    Ok(WeightedLine {
        intercept,
        slope,
        sum_weights: sum_w,
        x_mean,
        y_mean,
        sxx,
        sxy,
        weighted_rss,
        n_observations: n_valid,
    })
}
