//! Size factor implementation.

use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor};

/// Size style factor: natural log of market capitalisation.
///
/// A zero market cap is treated as missing; negative values have no logarithm and
/// are missing as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeStyle;

impl StyleDescriptor for SizeStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Size
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        inputs
            .iter()
            .map(|s| {
                let mcap = s.market_cap();
                if mcap > 0.0 { mcap.ln() } else { f64::NAN }
            })
            .collect()
    }

    fn required_inputs(&self) -> &[&str] {
        &["shares_outstanding", "close"]
    }
}
