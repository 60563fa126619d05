//! Summary statistics of simulated portfolio values.

use std::collections::BTreeMap;

use equirisk_math::{
    MathError,
    stats::{mean, percentile_sorted, round_to},
};
use ndarray::{Array2, ArrayView1};
use serde::Serialize;

/// Percentile levels reported for final values and paths.
pub const PERCENTILE_LEVELS: [u8; 5] = [10, 25, 50, 75, 90];

/// Percentile band of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPercentiles {
    /// Days from today, 0 being today.
    pub day: usize,
    /// Portfolio value at each level, keyed by level.
    #[serde(flatten)]
    pub values: BTreeMap<u8, f64>,
}

/// Summary of a `simulations x (days + 1)` matrix of portfolio values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Mean final value over mean initial value, minus one.
    pub expected_return: f64,
    /// Final-period return at the `1 - confidence` percentile.
    pub var: f64,
    /// Mean final-period return at or below `var`.
    pub cvar: f64,
    /// Final value at each level of [`PERCENTILE_LEVELS`].
    pub final_value_percentiles: BTreeMap<u8, f64>,
    /// Percentile band of every simulated day.
    pub path_percentiles: Vec<DayPercentiles>,
}

fn sorted(values: ArrayView1<'_, f64>) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

fn percentile_band(values: ArrayView1<'_, f64>) -> BTreeMap<u8, f64> {
    let values = sorted(values);
    PERCENTILE_LEVELS.iter().map(|&level| (level, round_to(percentile_sorted(&values, f64::from(level)), 2))).collect()
}

/// Summarise simulated paths at a confidence level.
///
/// Returns are rounded to 6 decimals and values to 2.
///
/// # Errors
/// Returns `MathError::EmptyData` when there are no paths or no days.
pub fn summarize(paths: &Array2<f64>, confidence: f64) -> Result<SimulationSummary, MathError> {
    let (simulations, steps) = paths.dim();
    if simulations == 0 || steps == 0 {
        return Err(MathError::EmptyData);
    }
    let initial = paths.column(0);
    let last = paths.column(steps - 1);

    let expected_return = last.sum() / initial.sum() - 1.0;

    let returns = sorted((&last / &initial - 1.0).view());
    let var = percentile_sorted(&returns, (1.0 - confidence) * 100.0);
    let tail: Vec<f64> = returns.iter().copied().take_while(|r| *r <= var).collect();
    let cvar = mean(&tail).unwrap_or(var);

    Ok(SimulationSummary {
        expected_return: round_to(expected_return, 6),
        var: round_to(var, 6),
        cvar: round_to(cvar, 6),
        final_value_percentiles: percentile_band(last),
        path_percentiles: paths
            .columns()
            .into_iter()
            .enumerate()
            .map(|(day, values)| DayPercentiles { day, values: percentile_band(values) })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};
    use rstest::rstest;

    use super::*;

    fn spread_paths() -> Array2<f64> {
        // 100 paths from 100 to 91..=190.
        let finals = Array1::from_iter((0..100).map(|i| 91.0 + f64::from(i)));
        Array2::from_shape_fn((100, 2), |(i, d)| if d == 0 { 100.0 } else { finals[i] })
    }

    #[test]
    fn flat_paths_have_no_risk() {
        let paths = Array2::from_elem((50, 11), 1000.0);
        let summary = summarize(&paths, 0.95).unwrap();
        assert_relative_eq!(summary.expected_return, 0.0);
        assert_relative_eq!(summary.var, 0.0);
        assert_relative_eq!(summary.cvar, 0.0);
        assert_eq!(summary.path_percentiles.len(), 11);
        assert_relative_eq!(summary.final_value_percentiles[&50], 1000.0);
    }

    #[rstest]
    #[case(0.95, -0.0405)]
    #[case(0.90, 0.009)]
    fn var_is_lower_tail_percentile(#[case] confidence: f64, #[case] expected: f64) {
        let summary = summarize(&spread_paths(), confidence).unwrap();
        assert_relative_eq!(summary.var, expected, epsilon = 1e-9);
        assert!(summary.cvar <= summary.var);
    }

    #[test]
    fn cvar_averages_the_tail() {
        // Returns -0.09..=-0.05 sit at or below the 5% percentile of -0.0405.
        let summary = summarize(&spread_paths(), 0.95).unwrap();
        assert_relative_eq!(summary.cvar, -0.07, epsilon = 1e-9);
        assert_relative_eq!(summary.expected_return, 0.405, epsilon = 1e-9);
    }

    #[test]
    fn final_percentiles_interpolate() {
        let summary = summarize(&spread_paths(), 0.95).unwrap();
        assert_relative_eq!(summary.final_value_percentiles[&10], 100.9);
        assert_relative_eq!(summary.final_value_percentiles[&90], 180.1);
    }

    #[test]
    fn day_rows_serialize_levels_as_keys() {
        let paths = array![[10.0, 11.0], [10.0, 9.0]];
        let summary = summarize(&paths, 0.95).unwrap();
        let json = serde_json::to_value(&summary.path_percentiles[1]).unwrap();
        assert_eq!(json["day"], 1);
        assert_eq!(json["50"], 10.0);
        assert_eq!(serde_json::to_value(&summary).unwrap()["final_value_percentiles"]["90"], 10.8);
    }

    #[test]
    fn empty_paths_rejected() {
        assert!(summarize(&Array2::zeros((0, 5)), 0.95).is_err());
    }
}
