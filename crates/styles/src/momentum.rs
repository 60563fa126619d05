//! Momentum factor implementation.

use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor, descriptor::or_nan};

/// Momentum style factor: ratio of the long to the short reference price, minus one.
///
/// With the default windows the long reference is the latest close (defined once 252
/// closes exist) and the short reference is the close 21 observations back, so the
/// descriptor is the trailing one-month price change for stocks with a full year of
/// history. Non-finite ratios are missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumStyle;

impl StyleDescriptor for MomentumStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Momentum
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        inputs
            .iter()
            .map(|s| {
                let m = or_nan(s.prices.reference_long) / or_nan(s.prices.reference_short) - 1.0;
                if m.is_finite() { m } else { f64::NAN }
            })
            .collect()
    }

    fn required_inputs(&self) -> &[&str] {
        &["reference_long", "reference_short"]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use equirisk_primitives::StockId;

    use super::*;

    #[test]
    fn momentum_from_references() {
        let mut full = StockInputs::new(StockId::new(1), None);
        full.prices.reference_long = Some(110.0);
        full.prices.reference_short = Some(100.0);
        let mut short_history = full.clone();
        short_history.prices.reference_long = None;

        let raw = MomentumStyle.raw_scores(&[full, short_history]);
        assert_relative_eq!(raw[0], 0.1, epsilon = 1e-12);
        assert!(raw[1].is_nan());
    }
}
