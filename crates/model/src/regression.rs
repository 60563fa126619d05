//! Cross-sectional regression of excess returns on factor exposures.

use equirisk_math::constrained_wls;
use equirisk_primitives::{Date, FactorReturn, Market, StockId};
use ndarray::{Array1, Array2};

use crate::{DesignMatrix, ModelError};

/// Regression weights `sqrt(max(mcap, 0))`, with zero or NaN weights replaced by one.
#[must_use]
pub fn regression_weights(market_caps: &Array1<f64>) -> Array1<f64> {
    market_caps.mapv(|cap| {
        let w = cap.max(0.0).sqrt();
        if w.is_nan() || w == 0.0 { 1.0 } else { w }
    })
}

/// Market-cap share of each industry column in `industries` (n x i one-hot).
///
/// Missing caps count as zero. Falls back to an equal split when the total is zero.
#[must_use]
pub fn industry_cap_shares(industries: &Array2<f64>, market_caps: &Array1<f64>) -> Array1<f64> {
    let caps = market_caps.mapv(|c| if c.is_finite() { c } else { 0.0 });
    let sums = industries.t().dot(&caps);
    let total = sums.sum();
    let n = sums.len();
    if total > 0.0 {
        sums / total
    } else {
        Array1::from_elem(n, 1.0 / n.max(1) as f64)
    }
}

/// One day's regression output.
#[derive(Debug, Clone)]
pub struct CrossSectionFit {
    /// Stocks that entered the regression, in row order.
    pub stock_ids: Vec<StockId>,
    /// Factor names in column order.
    pub factor_names: Vec<String>,
    /// Estimated factor returns (k,).
    pub factor_returns: Array1<f64>,
    /// Residual returns `y - X f` (n,).
    pub specific_returns: Array1<f64>,
    /// Cap share of each industry column.
    pub industry_shares: Array1<f64>,
}

impl CrossSectionFit {
    /// Factor return by name.
    #[must_use]
    pub fn factor_return(&self, name: &str) -> Option<f64> {
        self.factor_names.iter().position(|n| n == name).map(|i| self.factor_returns[i])
    }

    /// `sum(share_j * industry_return_j)`, zero up to solver precision.
    #[must_use]
    pub fn industry_neutrality(&self) -> f64 {
        let offset = self.factor_names.len() - self.industry_shares.len();
        self.industry_shares.dot(&self.factor_returns.slice(ndarray::s![offset..]))
    }

    /// Rows to persist, one per factor.
    #[must_use]
    pub fn to_rows(&self, market: Market, date: Date) -> Vec<FactorReturn> {
        self.factor_names
            .iter()
            .zip(self.factor_returns.iter())
            .map(|(name, value)| FactorReturn::new(market, date, name.clone(), *value))
            .collect()
    }
}

/// Fit the industry-neutral regression over every row of `design`.
///
/// `excess_returns` and `market_caps` are aligned with the design rows.
///
/// # Errors
/// Returns error if the inputs are misaligned or the KKT system is singular.
pub fn fit_cross_section(
    design: &DesignMatrix,
    excess_returns: &Array1<f64>,
    market_caps: &Array1<f64>,
) -> Result<CrossSectionFit, ModelError> {
    let n = design.height();
    if excess_returns.len() != n || market_caps.len() != n {
        return Err(ModelError::DimensionMismatch(format!(
            "{n} design rows, {} returns, {} market caps",
            excess_returns.len(),
            market_caps.len()
        )));
    }

    let x = design.to_array()?;
    let k = x.ncols();
    let industry_offset = k - design.industry_names().len();

    let industries = x.slice(ndarray::s![.., industry_offset..]).to_owned();
    let industry_shares = industry_cap_shares(&industries, market_caps);

    let mut constraint = Array1::zeros(k);
    constraint.slice_mut(ndarray::s![industry_offset..]).assign(&industry_shares);

    let weights = regression_weights(market_caps);
    let result = constrained_wls(excess_returns, &x, &weights, &constraint)?;

    Ok(CrossSectionFit {
        stock_ids: design.stock_ids()?,
        factor_names: design.factor_names().to_vec(),
        factor_returns: result.factor_returns,
        specific_returns: result.specific_returns,
        industry_shares,
    })
}
