//! Quality factor implementation.

use equirisk_math::{DEFAULT_N_MAD, winsorize, z_score};
use equirisk_primitives::StyleFactor;
use ndarray::Array1;

use crate::{StockInputs, StyleDescriptor, descriptor::or_nan};

/// Quality style factor: equal-weighted mean of the winsorized, unweighted z-scores of
/// return on equity and operating margin.
///
/// A stock missing either component has no quality score.
#[derive(Debug, Clone, Copy)]
pub struct QualityStyle {
    n_mad: f64,
}

impl QualityStyle {
    /// Create a quality descriptor with the default clipping width.
    #[must_use]
    pub const fn new() -> Self {
        Self { n_mad: DEFAULT_N_MAD }
    }

    /// Create a quality descriptor with a custom clipping width.
    #[must_use]
    pub const fn with_n_mad(n_mad: f64) -> Self {
        Self { n_mad }
    }

    fn component(&self, raw: Array1<f64>) -> Array1<f64> {
        let clipped = winsorize(&raw, self.n_mad);
        // Unweighted z-scores never fail on length.
        z_score(&clipped, None).unwrap_or_else(|_| clipped.mapv(|_| f64::NAN))
    }
}

impl Default for QualityStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleDescriptor for QualityStyle {
    fn factor(&self) -> StyleFactor {
        StyleFactor::Quality
    }

    fn raw_scores(&self, inputs: &[StockInputs]) -> Array1<f64> {
        let roe = self.component(inputs.iter().map(|s| or_nan(s.return_on_equity)).collect());
        let margin = self.component(inputs.iter().map(|s| or_nan(s.operating_margin)).collect());
        (roe + margin) / 2.0
    }

    fn required_inputs(&self) -> &[&str] {
        &["return_on_equity", "operating_margin"]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use equirisk_primitives::StockId;

    use super::*;

    fn stock(roe: Option<f64>, margin: Option<f64>) -> StockInputs {
        StockInputs { return_on_equity: roe, operating_margin: margin, ..StockInputs::new(StockId::new(1), None) }
    }

    #[test]
    fn quality_averages_component_z_scores() {
        let inputs = [stock(Some(0.1), Some(0.3)), stock(Some(0.2), Some(0.2)), stock(Some(0.3), Some(0.1))];
        let raw = QualityStyle::new().raw_scores(&inputs);

        // Opposite rankings cancel out.
        for v in raw.iter() {
            assert_relative_eq!(*v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn quality_missing_component_is_nan() {
        let inputs = [stock(Some(0.1), Some(0.3)), stock(None, Some(0.2)), stock(Some(0.3), Some(0.1))];
        let raw = QualityStyle::new().raw_scores(&inputs);
        assert!(raw[1].is_nan());
        assert!(raw[0].is_finite());
    }
}
