//! Standardised style exposures of a cross-section.

use std::collections::HashSet;

use equirisk_math::{Winsorizer, z_score};
use equirisk_primitives::{StockId, StyleExposures, StyleFactor};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{
    IndustryDummies, LeverageStyle, MomentumStyle, QualityStyle, SizeStyle, StockInputs,
    StyleDescriptor, StyleError, ValueStyle, VolatilityStyle,
};

/// Configuration of the exposure standardisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Clipping width of the MAD winsorization.
    pub n_mad: f64,
    /// Valid observations a style column needs; sparser columns are set to zero.
    pub min_valid: usize,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self { n_mad: 3.0, min_valid: 2 }
    }
}

/// Style and industry exposures of one cross-section, row-aligned with `stock_ids`.
#[derive(Debug, Clone)]
pub struct ExposureSet {
    /// Stocks in row order.
    pub stock_ids: Vec<StockId>,
    /// `N x 6` standardised style exposures in [`StyleFactor::ALL`] order, NaN where missing.
    pub styles: Array2<f64>,
    /// Industry indicator columns.
    pub industries: IndustryDummies,
    /// Market capitalisation per stock, NaN where unknown.
    pub market_caps: Array1<f64>,
}

impl ExposureSet {
    /// Number of stocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stock_ids.len()
    }

    /// Whether the cross-section is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stock_ids.is_empty()
    }

    /// Exposures of one style factor across stocks.
    #[must_use]
    pub fn style_column(&self, factor: StyleFactor) -> ArrayView1<'_, f64> {
        self.styles.column(factor.index())
    }

    /// Style exposures of the stock in `row`, NaN mapped to `None`.
    #[must_use]
    pub fn style_exposures(&self, row: usize) -> StyleExposures {
        let mut out = StyleExposures::default();
        for factor in StyleFactor::ALL {
            let v = self.styles[[row, factor.index()]];
            out.set(factor, (!v.is_nan()).then_some(v));
        }
        out
    }

    /// `(stock, exposures)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (StockId, StyleExposures)> + '_ {
        self.stock_ids.iter().enumerate().map(|(row, id)| (*id, self.style_exposures(row)))
    }
}

/// Builds standardised style exposures and industry dummies from raw inputs.
#[derive(Debug)]
pub struct ExposureBuilder {
    config: ExposureConfig,
    descriptors: Vec<Box<dyn StyleDescriptor>>,
}

impl ExposureBuilder {
    /// Create a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExposureConfig::default())
    }

    /// Create a builder with a custom configuration.
    #[must_use]
    pub fn with_config(config: ExposureConfig) -> Self {
        let descriptors: Vec<Box<dyn StyleDescriptor>> = vec![
            Box::new(SizeStyle),
            Box::new(ValueStyle),
            Box::new(MomentumStyle),
            Box::new(VolatilityStyle),
            Box::new(QualityStyle::with_n_mad(config.n_mad)),
            Box::new(LeverageStyle),
        ];
        Self { config, descriptors }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExposureConfig {
        &self.config
    }

    /// Compute exposures for a cross-section.
    ///
    /// Each raw column is winsorized and then z-scored with `sqrt(market cap)` weights
    /// over its valid observations (a zero market cap carries no weight). A column with
    /// fewer than `min_valid` valid observations is zero for every stock.
    ///
    /// # Errors
    /// Returns error on an invalid configuration or a duplicated stock.
    pub fn build(&self, inputs: &[StockInputs]) -> Result<ExposureSet, StyleError> {
        let winsorizer =
            Winsorizer::new(self.config.n_mad).map_err(|e| StyleError::InvalidConfig(e.to_string()))?;
        let mut seen = HashSet::with_capacity(inputs.len());
        if let Some(dup) = inputs.iter().find(|s| !seen.insert(s.stock_id)) {
            return Err(StyleError::DuplicateStock(dup.stock_id));
        }

        let market_caps: Array1<f64> = inputs.iter().map(StockInputs::market_cap).collect();
        let weights = market_caps.mapv(|m| {
            let w = m.max(0.0).sqrt();
            if w > 0.0 { w } else { f64::NAN }
        });

        let mut styles = Array2::from_elem((inputs.len(), StyleFactor::COUNT), f64::NAN);
        for descriptor in &self.descriptors {
            let raw = descriptor.raw_scores(inputs);
            let standardized = self.standardize(&winsorizer, &raw, &weights)?;
            styles.column_mut(descriptor.factor().index()).assign(&standardized);
        }

        Ok(ExposureSet {
            stock_ids: inputs.iter().map(|s| s.stock_id).collect(),
            styles,
            industries: IndustryDummies::from_inputs(inputs),
            market_caps,
        })
    }

    fn standardize(
        &self,
        winsorizer: &Winsorizer,
        raw: &Array1<f64>,
        weights: &Array1<f64>,
    ) -> Result<Array1<f64>, StyleError> {
        let valid: Vec<usize> = (0..raw.len()).filter(|&i| !raw[i].is_nan()).collect();
        if valid.len() < self.config.min_valid {
            return Ok(Array1::zeros(raw.len()));
        }

        let values: Array1<f64> = valid.iter().map(|&i| raw[i]).collect();
        let w: Array1<f64> = valid.iter().map(|&i| weights[i]).collect();
        let z = z_score(&winsorizer.apply(&values), Some(&w))?;

        let mut out = Array1::from_elem(raw.len(), f64::NAN);
        for (&i, v) in valid.iter().zip(z.iter()) {
            out[i] = *v;
        }
        Ok(out)
    }
}

impl Default for ExposureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
