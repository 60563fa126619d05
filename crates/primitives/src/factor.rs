//! Factor-related type definitions.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{Date, Market, StockId};

/// Name of the intercept factor every stock is exposed to with loading 1.
pub const MARKET_FACTOR: &str = "market";

/// The six style factors of the model, in design-matrix column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleFactor {
    /// Log market capitalisation.
    Size,
    /// Book-to-price.
    Value,
    /// Trailing price momentum.
    Momentum,
    /// Exponentially weighted return volatility.
    Volatility,
    /// Profitability composite (ROE and operating margin).
    Quality,
    /// Debt ratio.
    Leverage,
}

impl StyleFactor {
    /// All style factors in column order.
    pub const ALL: [Self; 6] =
        [Self::Size, Self::Value, Self::Momentum, Self::Volatility, Self::Quality, Self::Leverage];

    /// Number of style factors.
    pub const COUNT: usize = Self::ALL.len();

    /// Column name of the factor.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Value => "value",
            Self::Momentum => "momentum",
            Self::Volatility => "volatility",
            Self::Quality => "quality",
            Self::Leverage => "leverage",
        }
    }

    /// Position of the factor in [`StyleFactor::ALL`].
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Look up a style factor by column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for StyleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standardised style z-scores of one stock. `None` marks a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleExposures {
    /// Size z-score.
    pub size: Option<f64>,
    /// Value z-score.
    pub value: Option<f64>,
    /// Momentum z-score.
    pub momentum: Option<f64>,
    /// Volatility z-score.
    pub volatility: Option<f64>,
    /// Quality z-score.
    pub quality: Option<f64>,
    /// Leverage z-score.
    pub leverage: Option<f64>,
}

impl StyleExposures {
    /// Get the exposure for a style factor.
    #[must_use]
    pub const fn get(&self, factor: StyleFactor) -> Option<f64> {
        match factor {
            StyleFactor::Size => self.size,
            StyleFactor::Value => self.value,
            StyleFactor::Momentum => self.momentum,
            StyleFactor::Volatility => self.volatility,
            StyleFactor::Quality => self.quality,
            StyleFactor::Leverage => self.leverage,
        }
    }

    /// Set the exposure for a style factor.
    pub const fn set(&mut self, factor: StyleFactor, value: Option<f64>) {
        match factor {
            StyleFactor::Size => self.size = value,
            StyleFactor::Value => self.value = value,
            StyleFactor::Momentum => self.momentum = value,
            StyleFactor::Volatility => self.volatility = value,
            StyleFactor::Quality => self.quality = value,
            StyleFactor::Leverage => self.leverage = value,
        }
    }

    /// Exposures in [`StyleFactor::ALL`] order.
    #[must_use]
    pub fn to_array(&self) -> [Option<f64>; StyleFactor::COUNT] {
        StyleFactor::ALL.map(|f| self.get(f))
    }

    /// All six values, or `None` when any is missing.
    #[must_use]
    pub fn complete(&self) -> Option<[f64; StyleFactor::COUNT]> {
        let values = self.to_array();
        if values.iter().all(|v| v.is_some_and(f64::is_finite)) {
            Some(values.map(|v| v.unwrap_or_default()))
        } else {
            None
        }
    }

    /// Whether every value is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_array().iter().all(Option::is_none)
    }

    /// Copy with every present value rounded to `decimals` places, as persisted.
    #[must_use]
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let mut out = Self::default();
        for factor in StyleFactor::ALL {
            out.set(
                factor,
                self.get(factor).filter(|v| v.is_finite()).map(|v| (v * scale).round() / scale),
            );
        }
        out
    }
}

/// One stored exposure row: `(stock, date)` to six style z-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExposure {
    /// Stock the row belongs to.
    pub stock_id: StockId,
    /// Computation date.
    pub date: Date,
    /// Style z-scores.
    pub styles: StyleExposures,
}

/// One stored factor return: `(market, date, factor)` to a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorReturn {
    /// Market the regression ran on.
    pub market: Market,
    /// Regression date.
    pub date: Date,
    /// Factor name: "market", a style name, or an industry label.
    pub factor: String,
    /// Estimated factor return.
    pub value: f64,
}

impl FactorReturn {
    /// Create a new factor return row.
    #[must_use]
    pub fn new(market: Market, date: Date, factor: impl Into<String>, value: f64) -> Self {
        Self { market, date, factor: factor.into(), value }
    }
}

/// Factor covariance snapshot for one market and date.
///
/// Serialised with the matrix as a nested numeric array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CovarianceRepr", into = "CovarianceRepr")]
pub struct FactorCovariance {
    /// Market the covariance belongs to.
    pub market: Market,
    /// Estimation date.
    pub date: Date,
    /// K x K symmetric matrix.
    pub matrix: Array2<f64>,
}

impl FactorCovariance {
    /// Create a new covariance snapshot.
    #[must_use]
    pub const fn new(market: Market, date: Date, matrix: Array2<f64>) -> Self {
        Self { market, date, matrix }
    }

    /// Number of factors the matrix covers.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Whether the snapshot can be used with `n_factors` live factor names.
    ///
    /// A matrix of a different dimension is stale and treated as absent.
    #[must_use]
    pub fn matches(&self, n_factors: usize) -> bool {
        self.matrix.nrows() == n_factors && self.matrix.ncols() == n_factors
    }

    /// The matrix as nested rows.
    #[must_use]
    pub fn to_nested(&self) -> Vec<Vec<f64>> {
        self.matrix.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Build a snapshot from nested rows. Ragged or non-square input is rejected.
    ///
    /// # Errors
    /// Returns a description of the shape problem.
    pub fn from_nested(market: Market, date: Date, rows: Vec<Vec<f64>>) -> Result<Self, String> {
        let n = rows.len();
        if rows.iter().any(|r| r.len() != n) {
            return Err(format!("covariance matrix must be square, got {n} rows of uneven length"));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((n, n), flat).map_err(|e| e.to_string())?;
        Ok(Self { market, date, matrix })
    }
}

#[derive(Serialize, Deserialize)]
struct CovarianceRepr {
    market: Market,
    date: Date,
    matrix: Vec<Vec<f64>>,
}

impl From<FactorCovariance> for CovarianceRepr {
    fn from(cov: FactorCovariance) -> Self {
        Self { matrix: cov.to_nested(), market: cov.market, date: cov.date }
    }
}

impl TryFrom<CovarianceRepr> for FactorCovariance {
    type Error = String;

    fn try_from(repr: CovarianceRepr) -> Result<Self, Self::Error> {
        Self::from_nested(repr.market, repr.date, repr.matrix)
    }
}
