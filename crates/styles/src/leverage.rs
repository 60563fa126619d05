//! Leverage factor implementation.

use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor, descriptor::or_nan};

/// Leverage style factor: the raw debt ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeverageStyle;

impl StyleDescriptor for LeverageStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Leverage
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        inputs.iter().map(|s| or_nan(s.debt_ratio)).collect()
    }

    fn required_inputs(&self) -> &[&str] {
        &["debt_ratio"]
    }
}
