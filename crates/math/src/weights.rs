//! Weight generation functions.

use ndarray::Array1;

/// Per-period decay factor for a half-life: `0.5^(1 / half_life)`.
#[must_use]
pub fn ewm_decay(half_life: f64) -> f64 {
    0.5_f64.powf(1.0 / half_life)
}

/// Generate exponentially decaying weights.
///
/// # Arguments
/// * `window` - Number of trailing periods
/// * `half_life` - Half-life in periods
///
/// # Returns
/// Array of weights ordered oldest to newest (the last entry is the most recent and
/// heaviest), normalized to sum to 1. A non-positive half-life yields all zeros.
#[must_use]
pub fn exp_weights(window: usize, half_life: f64) -> Array1<f64> {
    if window == 0 || half_life <= 0.0 || !half_life.is_finite() {
        return Array1::zeros(window);
    }

    let decay = ewm_decay(half_life);
    let mut weights = Array1::from_shape_fn(window, |i| decay.powi((window - 1 - i) as i32));

    let total: f64 = weights.sum();
    if total > 0.0 {
        weights /= total;
    }

    weights
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn exp_weights_sum_to_one() {
        let weights = exp_weights(20, 5.0);
        assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn exp_weights_increase_towards_newest() {
        let weights = exp_weights(10, 3.0);
        for i in 1..weights.len() {
            assert!(weights[i] > weights[i - 1]);
        }
    }

    #[rstest]
    #[case(10, 5)]
    #[case(252, 90)]
    #[case(300, 42)]
    fn exp_weights_half_life_property(#[case] window: usize, #[case] half_life: usize) {
        let weights = exp_weights(window, half_life as f64);
        let newest = weights[window - 1];
        let ratio = weights[window - 1 - half_life] / newest;
        assert_relative_eq!(ratio, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn exp_weights_zero_window() {
        assert!(exp_weights(0, 5.0).is_empty());
    }

    #[test]
    fn exp_weights_zero_half_life() {
        let weights = exp_weights(10, 0.0);
        assert!(weights.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn exp_weights_single_element() {
        let weights = exp_weights(1, 5.0);
        assert_relative_eq!(weights[0], 1.0, epsilon = 1e-10);
    }
}
