//! Factor beta, OLS beta fallback and variance decomposition.

use equirisk_math::stats;
use equirisk_primitives::{Date, LabeledSeries, MARKET_FACTOR, StyleFactor, sector_is_assigned};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::ModelError;

fn check_dims(x: &Array1<f64>, cov: &Array2<f64>) -> Result<(), ModelError> {
    if cov.nrows() != x.len() || cov.ncols() != x.len() {
        return Err(ModelError::DimensionMismatch(format!(
            "exposure of length {} against {}x{} covariance",
            x.len(),
            cov.nrows(),
            cov.ncols()
        )));
    }
    Ok(())
}

/// Barra beta `(X_i' Σ X_m) / (X_m' Σ X_m)`.
///
/// Returns 1.0 when the denominator is zero.
///
/// # Errors
/// Returns `ModelError::DimensionMismatch` if the vectors and matrix disagree.
pub fn factor_beta(x_i: &Array1<f64>, x_m: &Array1<f64>, cov: &Array2<f64>) -> Result<f64, ModelError> {
    check_dims(x_i, cov)?;
    check_dims(x_m, cov)?;
    let sigma_m = cov.dot(x_m);
    let denom = x_m.dot(&sigma_m);
    if denom == 0.0 {
        return Ok(1.0);
    }
    Ok(x_i.dot(&sigma_m) / denom)
}

/// `Cov(r_i, r_m) / Var(r_m)` over the dates both series cover.
///
/// Non-finite values are dropped before alignment. Returns 0.0 with fewer than two
/// aligned points or zero market variance.
#[must_use]
pub fn ols_beta(stock_returns: &LabeledSeries<Date>, market_returns: &LabeledSeries<Date>) -> f64 {
    let (s, m): (Vec<f64>, Vec<f64>) =
        stock_returns.finite().inner_join(&market_returns.finite()).into_iter().map(|(_, a, b)| (a, b)).unzip();
    let (Some(cov), Some(var)) = (stats::sample_covariance(&s, &m), stats::sample_variance(&m)) else {
        return 0.0;
    };
    if var == 0.0 { 0.0 } else { cov / var }
}

/// Split of a stock's variance into factor and specific parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskDecomposition {
    /// Factor plus specific variance.
    pub total_var: f64,
    /// `X' Σ X`.
    pub factor_var: f64,
    /// Idiosyncratic variance.
    pub specific_var: f64,
    /// Share of factor variance in the total, 0 when the total is not positive.
    pub factor_pct: f64,
}

/// Decompose the variance of exposure `x` under factor covariance `cov`.
///
/// # Errors
/// Returns `ModelError::DimensionMismatch` if `x` and `cov` disagree.
pub fn risk_decomposition(
    x: &Array1<f64>,
    cov: &Array2<f64>,
    specific_var: f64,
) -> Result<RiskDecomposition, ModelError> {
    check_dims(x, cov)?;
    let factor_var = x.dot(&cov.dot(x));
    let total_var = factor_var + specific_var;
    let factor_pct = if total_var > 0.0 { factor_var / total_var } else { 0.0 };
    Ok(RiskDecomposition { total_var, factor_var, specific_var, factor_pct })
}

/// Exposure vector over `factor_names`: 1 at the market factor, style values at style
/// names and 1 at the stock's sector. Names not present are left at zero.
#[must_use]
pub fn build_exposure_vector(
    styles: &[f64; StyleFactor::COUNT],
    sector: Option<&str>,
    factor_names: &[String],
) -> Array1<f64> {
    let mut x = Array1::zeros(factor_names.len());
    for (i, name) in factor_names.iter().enumerate() {
        if name == MARKET_FACTOR {
            x[i] = 1.0;
        } else if let Some(factor) = StyleFactor::from_name(name) {
            x[i] = styles[factor.index()];
        } else if sector_is_assigned(sector) && sector == Some(name.as_str()) {
            x[i] = 1.0;
        }
    }
    x
}

/// Market portfolio exposure: 1 at the market factor, zero elsewhere.
#[must_use]
pub fn market_exposure(factor_names: &[String]) -> Array1<f64> {
    factor_names.iter().map(|n| if n == MARKET_FACTOR { 1.0 } else { 0.0 }).collect()
}
