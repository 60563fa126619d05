//! Regression design matrix `[market | styles | industries]`.

use equirisk_primitives::{MARKET_FACTOR, StockId, StyleFactor};
use equirisk_styles::ExposureSet;
use ndarray::{Array1, Array2};
use polars::prelude::*;

use crate::ModelError;

const STOCK_ID: &str = "stock_id";

/// Complete-case design matrix of one cross-section.
///
/// Rows are stocks with a value in every column; the column order is the market
/// intercept, the six styles in [`StyleFactor::ALL`] order, then the industries in
/// ascending label order.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    frame: DataFrame,
    factor_names: Vec<String>,
}

impl DesignMatrix {
    /// Assemble the design matrix from exposures and drop incomplete rows.
    ///
    /// Industries left without a row are dropped from the columns.
    ///
    /// # Errors
    /// Returns error if the frame cannot be built.
    pub fn build(exposures: &ExposureSet) -> Result<Self, ModelError> {
        let n = exposures.len();
        let mut factor_names = Vec::with_capacity(1 + StyleFactor::COUNT + exposures.industries.len());
        let mut columns = Vec::with_capacity(2 + StyleFactor::COUNT + exposures.industries.len());

        let ids: Vec<u64> = exposures.stock_ids.iter().map(|id| id.0).collect();
        columns.push(Column::new(STOCK_ID.into(), ids));

        factor_names.push(MARKET_FACTOR.to_string());
        columns.push(Column::new(MARKET_FACTOR.into(), vec![1.0_f64; n]));

        for factor in StyleFactor::ALL {
            let values: Vec<Option<f64>> =
                exposures.style_column(factor).iter().map(|v| (!v.is_nan()).then_some(*v)).collect();
            factor_names.push(factor.name().to_string());
            columns.push(Column::new(factor.name().into(), values));
        }

        for (j, name) in exposures.industries.names.iter().enumerate() {
            let values: Vec<f64> = exposures.industries.matrix.column(j).to_vec();
            factor_names.push(name.clone());
            columns.push(Column::new(name.as_str().into(), values));
        }

        let frame = DataFrame::new(columns)?;
        let complete = complete_rows(&frame, &factor_names)?;
        Self { frame: frame.filter(&complete)?, factor_names }.without_empty_industries()
    }

    /// Column names in regression order.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Number of style columns.
    #[must_use]
    pub const fn n_styles(&self) -> usize {
        StyleFactor::COUNT
    }

    /// Industry column names.
    #[must_use]
    pub fn industry_names(&self) -> &[String] {
        &self.factor_names[1 + StyleFactor::COUNT..]
    }

    /// Number of complete rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Stock of each row.
    ///
    /// # Errors
    /// Returns error if the id column is missing.
    pub fn stock_ids(&self) -> Result<Vec<StockId>, ModelError> {
        let ids = self.frame.column(STOCK_ID).map_err(|_| ModelError::MissingColumn(STOCK_ID.to_string()))?;
        let ids = ids.u64().map_err(|_| ModelError::InvalidConfig(format!("column {STOCK_ID} is not u64")))?;
        Ok(ids.into_iter().map(|id| StockId::new(id.unwrap_or_default())).collect())
    }

    /// Keep only the rows where `keep` is true, then drop industries left without a row.
    ///
    /// # Errors
    /// Returns error if `keep` does not have one entry per row.
    pub fn retain_rows(&self, keep: &[bool]) -> Result<Self, ModelError> {
        if keep.len() != self.height() {
            return Err(ModelError::DimensionMismatch(format!(
                "row mask has {} entries for {} rows",
                keep.len(),
                self.height()
            )));
        }
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        Self { frame: self.frame.filter(&mask)?, factor_names: self.factor_names.clone() }.without_empty_industries()
    }

    /// An industry column with no member row makes the constrained system singular.
    fn without_empty_industries(mut self) -> Result<Self, ModelError> {
        let mut empty = Vec::new();
        for name in self.industry_names() {
            if extract_array(&self.frame, name)?.sum() == 0.0 {
                empty.push(name.clone());
            }
        }
        for name in &empty {
            self.frame = self.frame.drop(name)?;
        }
        self.factor_names.retain(|name| !empty.contains(name));
        Ok(self)
    }

    /// The `N x K` matrix in [`factor_names`](Self::factor_names) order.
    ///
    /// # Errors
    /// Returns error if a factor column is missing or not numeric.
    pub fn to_array(&self) -> Result<Array2<f64>, ModelError> {
        let mut x = Array2::zeros((self.height(), self.factor_names.len()));
        for (j, name) in self.factor_names.iter().enumerate() {
            x.column_mut(j).assign(&extract_array(&self.frame, name)?);
        }
        Ok(x)
    }

    /// One factor column.
    ///
    /// # Errors
    /// Returns error if the column is missing or not numeric.
    pub fn column(&self, name: &str) -> Result<Array1<f64>, ModelError> {
        extract_array(&self.frame, name)
    }
}

fn complete_rows(frame: &DataFrame, names: &[String]) -> Result<BooleanChunked, ModelError> {
    let mut mask = BooleanChunked::full("complete".into(), true, frame.height());
    for name in names {
        let column = frame.column(name).map_err(|_| ModelError::MissingColumn(name.clone()))?;
        mask = &mask & &column.is_not_null();
    }
    Ok(mask)
}

fn extract_array(df: &DataFrame, col_name: &str) -> Result<Array1<f64>, ModelError> {
    let series = df.column(col_name).map_err(|_| ModelError::MissingColumn(col_name.to_string()))?;

    let chunked =
        series.f64().map_err(|_| ModelError::InvalidConfig(format!("column {col_name} is not f64")))?;

    let values: Vec<f64> = chunked.into_iter().map(|opt| opt.unwrap_or(f64::NAN)).collect();

    Ok(Array1::from_vec(values))
}
