//! Value factor implementation.

use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor, descriptor::or_nan};

/// Value style factor: book-to-price, the reciprocal of price-to-book.
///
/// A zero price-to-book gives an infinite ratio, which is treated as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueStyle;

impl StyleDescriptor for ValueStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Value
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        inputs
            .iter()
            .map(|s| {
                let value = 1.0 / or_nan(s.price_to_book);
                if value.is_infinite() { f64::NAN } else { value }
            })
            .collect()
    }

    fn required_inputs(&self) -> &[&str] {
        &["price_to_book"]
    }
}

#[cfg(test)]
mod tests {
    use equirisk_primitives::StockId;

    use super::*;

    #[test]
    fn value_is_reciprocal_pbr() {
        let with_pbr = |pbr: Option<f64>| StockInputs { price_to_book: pbr, ..StockInputs::new(StockId::new(1), None) };
        let raw = ValueStyle.raw_scores(&[with_pbr(Some(2.0)), with_pbr(Some(0.0)), with_pbr(None)]);

        assert_eq!(raw[0], 0.5);
        assert!(raw[1].is_nan());
        assert!(raw[2].is_nan());
    }
}
