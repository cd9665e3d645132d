//! Chi-square goodness-of-fit for grouped binomial responses
//!
//! For each dose group with n subjects, observed proportion p and fitted
//! proportion p̂, the contribution is
//!
//! (n·p − n·p̂)² / (n·p̂·(1 − p̂))
//!
//! and the statistic has k − m degrees of freedom for k groups and m fitted
//! parameters.

use crate::errors::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Upper 5% points of the chi-square distribution for 1 to 4 degrees of freedom
const CRITICAL_95: [f64; 4] = [3.841, 5.991, 7.815, 9.488];

/// Critical value used for five or more degrees of freedom
const CRITICAL_95_DEFAULT: f64 = 11.070;

/// Expected proportions are kept this far from 0 and 1
const PROPORTION_EPS: f64 = 1e-10;

/// Result of a goodness-of-fit test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareFit {
    /// Chi-square statistic
    pub statistic: f64,
    /// Degrees of freedom
    pub df: usize,
    /// Tabulated 95% critical value
    pub critical: f64,
    /// Upper-tail p-value
    pub p_value: f64,
    /// statistic <= critical
    pub adequate: bool,
    /// statistic / df
    pub heterogeneity: f64,
    /// Per-group contributions, in input order
    pub contributions: Vec<f64>,
}

/// Tabulated 95% chi-square critical value
///
/// Exact to three decimals for 1 to 4 degrees of freedom; every larger df
/// shares one value.
pub fn chi_square_critical(df: usize) -> f64 {
    match df {
        1..=4 => CRITICAL_95[df - 1],
        _ => CRITICAL_95_DEFAULT,
    }
}

/// Upper-tail probability of a chi-square statistic
pub fn chi_square_p_value(statistic: f64, df: usize) -> CalcResult<f64> {
    if df == 0 {
        return Err(CalcError::invalid("df", "degrees of freedom must be > 0"));
    }
    let dist = ChiSquared::new(df as f64).map_err(|e| CalcError::Distribution(e.to_string()))?;
    Ok((1.0 - dist.cdf(statistic.max(0.0))).clamp(0.0, 1.0))
}

/// Binomial chi-square goodness-of-fit
///
/// # Arguments
/// * `observed` - Observed response proportions
/// * `expected` - Proportions predicted by the fitted model
/// * `sample_sizes` - Group sizes
/// * `n_params` - Number of fitted model parameters
pub fn binomial_chi_square(
    observed: &[f64],
    expected: &[f64],
    sample_sizes: &[u32],
    n_params: usize,
) -> CalcResult<ChiSquareFit> {
    if observed.is_empty() {
        return Err(CalcError::EmptyInput { field: "observed" });
    }
    if expected.len() != observed.len() {
        return Err(CalcError::DimensionMismatch {
            left: "observed",
            left_len: observed.len(),
            right: "expected",
            right_len: expected.len(),
        });
    }
    if sample_sizes.len() != observed.len() {
        return Err(CalcError::DimensionMismatch {
            left: "observed",
            left_len: observed.len(),
            right: "sample_sizes",
            right_len: sample_sizes.len(),
        });
    }

    let k = observed.len();
    if k <= n_params {
        return Err(CalcError::InsufficientData {
            valid: k,
            required: n_params + 1,
        });
    }
    let df = k - n_params;

    let contributions: Vec<f64> = observed
        .iter()
        .zip(expected)
        .zip(sample_sizes)
        .map(|((&p, &p_hat), &n)| {
            let p_hat = p_hat.clamp(PROPORTION_EPS, 1.0 - PROPORTION_EPS);
            let n = n as f64;
            (n * p - n * p_hat).powi(2) / (n * p_hat * (1.0 - p_hat))
        })
        .collect();

    let statistic: f64 = contributions.iter().sum();
    let critical = chi_square_critical(df);
    let p_value = chi_square_p_value(statistic, df)?;

    Ok(ChiSquareFit {
        statistic,
        df,
        critical,
        p_value,
        adequate: statistic <= critical,
        heterogeneity: statistic / df as f64,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_table() {
        assert_eq!(chi_square_critical(1), 3.841);
        assert_eq!(chi_square_critical(4), 9.488);
        assert_eq!(chi_square_critical(5), 11.070);
        assert_eq!(chi_square_critical(30), 11.070);
    }

    #[test]
    fn test_critical_table_agrees_with_distribution() {
        for df in 1..=5 {
            let p = chi_square_p_value(chi_square_critical(df), df).unwrap();
            assert!((p - 0.05).abs() < 1e-3, "df={} p={}", df, p);
        }
    }

    #[test]
    fn test_perfect_fit_is_zero() {
        let p = vec![0.1, 0.4, 0.7];
        let fit = binomial_chi_square(&p, &p, &[10, 10, 10], 2).unwrap();
        assert_eq!(fit.statistic, 0.0);
        assert_eq!(fit.df, 1);
        assert!(fit.adequate);
        assert!((fit.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_contribution_by_hand() {
        // n = 20, observed 0.5, expected 0.4: (10 - 8)^2 / (20 * 0.4 * 0.6) = 4 / 4.8
        let fit = binomial_chi_square(&[0.5, 0.2, 0.8], &[0.4, 0.2, 0.8], &[20, 10, 10], 2).unwrap();
        assert!((fit.contributions[0] - 4.0 / 4.8).abs() < 1e-12);
        assert!((fit.statistic - 4.0 / 4.8).abs() < 1e-12);
        assert!((fit.heterogeneity - fit.statistic).abs() < 1e-12);
    }

    #[test]
    fn test_poor_fit_flagged() {
        let fit =
            binomial_chi_square(&[0.9, 0.1, 0.9, 0.1], &[0.1, 0.9, 0.1, 0.9], &[50; 4], 2).unwrap();
        assert!(!fit.adequate);
        assert!(fit.p_value < 0.001);
    }

    #[test]
    fn test_requires_more_groups_than_parameters() {
        let result = binomial_chi_square(&[0.2, 0.8], &[0.2, 0.8], &[10, 10], 2);
        assert!(matches!(result, Err(CalcError::InsufficientData { .. })));
    }
}
