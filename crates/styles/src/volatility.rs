//! Volatility factor implementation.

use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor, descriptor::or_nan};

/// Volatility style factor: EWM standard deviation of daily returns, taken from
/// [`PriceFeatures::ewm_volatility`](crate::PriceFeatures::ewm_volatility).
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilityStyle;

impl StyleDescriptor for VolatilityStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Volatility
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        inputs.iter().map(|s| or_nan(s.prices.ewm_volatility)).collect()
    }

    fn required_inputs(&self) -> &[&str] {
        &["ewm_volatility"]
    }
}
