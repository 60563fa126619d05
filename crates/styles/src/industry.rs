//! Industry indicator columns.

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::StockInputs;

/// One-hot industry membership of a cross-section.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryDummies {
    /// Industry labels in column order (ascending).
    pub names: Vec<String>,
    /// `N x I` indicator matrix; rows without an industry are all zero.
    pub matrix: Array2<f64>,
}

impl IndustryDummies {
    /// Build the indicator columns for `inputs`.
    ///
    /// Stocks with a missing or "N/A" sector get a zero row. Columns exist only for
    /// sectors observed in the cross-section.
    #[must_use]
    pub fn from_inputs(inputs: &[StockInputs]) -> Self {
        let names: Vec<String> =
            inputs.iter().filter_map(StockInputs::industry).collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect();

        let mut matrix = Array2::zeros((inputs.len(), names.len()));
        for (row, stock) in inputs.iter().enumerate() {
            if let Some(col) = stock.industry().and_then(|s| names.iter().position(|n| n == s)) {
                matrix[[row, col]] = 1.0;
            }
        }
        Self { names, matrix }
    }

    /// Number of industry columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no stock has an industry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use equirisk_primitives::StockId;
    use ndarray::array;

    use super::*;

    #[test]
    fn dummies_sorted_and_zero_filled() {
        let inputs = [
            StockInputs::new(StockId::new(1), Some("Utilities")),
            StockInputs::new(StockId::new(2), Some("Energy")),
            StockInputs::new(StockId::new(3), Some("N/A")),
            StockInputs::new(StockId::new(4), None),
            StockInputs::new(StockId::new(5), Some("Energy")),
        ];
        let dummies = IndustryDummies::from_inputs(&inputs);

        assert_eq!(dummies.names, vec!["Energy".to_string(), "Utilities".to_string()]);
        assert_eq!(dummies.matrix, array![[0.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 0.0], [1.0, 0.0]]);
    }
}
