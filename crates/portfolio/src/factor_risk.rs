//! Portfolio risk through the stored factor model.

use std::collections::{BTreeMap, HashMap};

use equirisk_math::stats::round_to;
use equirisk_model::{
    FactorStore, MarketDataSource, RiskDecomposition, build_exposure_vector, factor_beta,
    latest_factor_names, market_exposure, risk_decomposition,
};
use equirisk_primitives::{DataCoverage, Market, StockId, StyleExposures, StyleFactor};
use ndarray::{Array1, Zip};
use serde::Serialize;
use tracing::debug;

use crate::PortfolioError;

/// Specific variance assumed for every holding with exposures.
///
/// This is a placeholder, not an estimate: stored regression residuals are not yet
/// turned into per-stock specific variances, so the specific share of factor risk is
/// indicative only.
pub const PLACEHOLDER_SPECIFIC_VARIANCE: f64 = 0.01;

/// Factor view of a portfolio's risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRisk {
    /// Portfolio beta against the market factor.
    pub beta: f64,
    /// Factor and specific variance of the portfolio.
    pub risk_decomposition: RiskDecomposition,
    /// Weighted exposure per factor name.
    pub portfolio_exposure: BTreeMap<String, f64>,
    /// Full when every holding has stored exposures.
    pub coverage: DataCoverage,
    /// Holdings with stored exposures.
    pub valid_stocks: usize,
    /// Holdings analysed.
    pub total_stocks: usize,
}

// Missing style values count as zero exposure.
fn style_values(styles: &StyleExposures) -> [f64; StyleFactor::COUNT] {
    styles.to_array().map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
}

/// Factor risk of a portfolio from the latest stored covariance and exposures of `market`.
///
/// `None` when no covariance is stored, its dimension disagrees with the latest factor
/// names, or no holding has exposures. Holdings without exposures are left out of the
/// portfolio exposure and lower the coverage to partial.
///
/// # Errors
/// Returns error if the store cannot be read or `weights` and `stock_ids` differ in length.
pub fn compute_factor_risk<S>(
    store: &S,
    stock_ids: &[StockId],
    weights: &Array1<f64>,
    market: Market,
) -> Result<Option<FactorRisk>, PortfolioError>
where
    S: MarketDataSource + FactorStore + ?Sized,
{
    if weights.len() != stock_ids.len() {
        return Err(PortfolioError::DimensionMismatch(format!(
            "{} weights for {} holdings",
            weights.len(),
            stock_ids.len()
        )));
    }
    let Some(covariance) = store.latest_covariance(market)? else {
        return Ok(None);
    };
    let names = latest_factor_names(store, market)?;
    if names.is_empty() || !covariance.matches(names.len()) {
        debug!(market = %market, dim = covariance.dim(), factors = names.len(), "covariance does not match factors");
        return Ok(None);
    }

    let exposures: HashMap<StockId, StyleExposures> =
        store.latest_exposures(market)?.into_iter().map(|row| (row.stock_id, row.styles)).collect();
    let sectors = store.sectors(market)?;

    let mut x_p = Array1::<f64>::zeros(names.len());
    let mut valid_stocks = 0;
    let mut specific_var = 0.0;
    for (stock_id, w) in stock_ids.iter().zip(weights) {
        let Some(styles) = exposures.get(stock_id) else {
            continue;
        };
        let sector = sectors.get(stock_id).and_then(Option::as_deref);
        let x_i = build_exposure_vector(&style_values(styles), sector, &names);
        Zip::from(&mut x_p).and(&x_i).for_each(|p, x| *p += w * x);
        specific_var += w * w * PLACEHOLDER_SPECIFIC_VARIANCE;
        valid_stocks += 1;
    }
    if valid_stocks == 0 {
        return Ok(None);
    }

    let beta = factor_beta(&x_p, &market_exposure(&names), &covariance.matrix)?;
    let decomposition = risk_decomposition(&x_p, &covariance.matrix, specific_var)?;

    Ok(Some(FactorRisk {
        beta: round_to(beta, 4),
        risk_decomposition: RiskDecomposition {
            total_var: round_to(decomposition.total_var, 8),
            factor_var: round_to(decomposition.factor_var, 8),
            specific_var: round_to(decomposition.specific_var, 8),
            factor_pct: round_to(decomposition.factor_pct, 8),
        },
        portfolio_exposure: names.into_iter().zip(x_p.iter().map(|v| round_to(*v, 4))).collect(),
        coverage: if valid_stocks == stock_ids.len() { DataCoverage::Full } else { DataCoverage::Partial },
        valid_stocks,
        total_stocks: stock_ids.len(),
    }))
}
