//! Marginal contribution to risk.

use equirisk_math::stats::round_to;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::PortfolioError;

/// Per-holding split of portfolio volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McarResult {
    /// Portfolio volatility `sqrt(w' S w)`, in the units of the covariance.
    pub portfolio_vol: f64,
    /// Marginal contribution `(S w)_i / vol` of each holding.
    pub mcar: Vec<f64>,
    /// `w_i * mcar_i`; sums to the portfolio volatility.
    pub contribution: Vec<f64>,
    /// Share of each holding in the total contribution.
    pub contribution_pct: Vec<f64>,
}

/// Split portfolio volatility across holdings.
///
/// With zero variance every marginal contribution is zero and the shares are equal.
/// When the contributions do not sum to a positive total the raw contributions are
/// reported as shares. Volatility and contributions are rounded to 8 decimals, shares
/// to 6.
///
/// # Errors
/// Returns `PortfolioError::DimensionMismatch` if `cov` is not `n x n` for `n` weights.
pub fn compute_mcar(weights: &Array1<f64>, cov: &Array2<f64>) -> Result<McarResult, PortfolioError> {
    let n = weights.len();
    if cov.dim() != (n, n) {
        return Err(PortfolioError::DimensionMismatch(format!(
            "covariance {:?} for {n} weights",
            cov.dim()
        )));
    }

    let sigma_w = cov.dot(weights);
    let variance = weights.dot(&sigma_w);
    let vol = if variance > 0.0 { variance.sqrt() } else { 0.0 };
    if vol == 0.0 {
        return Ok(McarResult {
            portfolio_vol: 0.0,
            mcar: vec![0.0; n],
            contribution: vec![0.0; n],
            contribution_pct: vec![1.0 / n as f64; n],
        });
    }

    let marginal = sigma_w / vol;
    let contribution = weights * &marginal;
    let total = contribution.sum();
    let pct = if total > 0.0 { &contribution / total } else { contribution.clone() };

    Ok(McarResult {
        portfolio_vol: round_to(vol, 8),
        mcar: marginal.iter().map(|m| round_to(*m, 8)).collect(),
        contribution: contribution.iter().map(|c| round_to(*c, 8)).collect(),
        contribution_pct: pct.iter().map(|p| round_to(*p, 6)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    fn covariance() -> Array2<f64> {
        array![[0.04, 0.006, 0.002], [0.006, 0.09, 0.01], [0.002, 0.01, 0.0225]]
    }

    #[rstest]
    #[case(array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0])]
    #[case(array![0.5, 0.3, 0.2])]
    #[case(array![0.1, 0.1, 0.8])]
    fn contributions_add_up(#[case] weights: Array1<f64>) {
        let cov = covariance();
        let result = compute_mcar(&weights, &cov).unwrap();
        let vol = weights.dot(&cov.dot(&weights)).sqrt();

        assert_relative_eq!(result.portfolio_vol, vol, epsilon = 1e-8);
        assert_relative_eq!(result.contribution.iter().sum::<f64>(), vol, epsilon = 1e-7);
        assert_relative_eq!(result.contribution_pct.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_variance_splits_equally() {
        let result = compute_mcar(&array![0.25, 0.75], &Array2::zeros((2, 2))).unwrap();
        assert_eq!(result.portfolio_vol, 0.0);
        assert_eq!(result.mcar, vec![0.0, 0.0]);
        assert_eq!(result.contribution_pct, vec![0.5, 0.5]);
    }

    #[test]
    fn single_holding_carries_all_risk() {
        let result = compute_mcar(&array![1.0], &array![[0.0004]]).unwrap();
        assert_relative_eq!(result.portfolio_vol, 0.02);
        assert_eq!(result.contribution_pct, vec![1.0]);
    }

    #[test]
    fn shape_checked() {
        assert!(compute_mcar(&array![0.5, 0.5], &Array2::zeros((3, 3))).is_err());
    }
}
