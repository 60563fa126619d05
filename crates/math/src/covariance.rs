//! Exponentially weighted and sample covariance estimators.

use ndarray::{Array1, Array2, Axis};

use crate::{MathError, exp_weights, linalg::symmetrize, weights::ewm_decay};

/// Exponentially weighted covariance of factor returns.
///
/// `returns` is `T x K` with rows ordered oldest to newest. Rows are weighted by
/// [`exp_weights`], the weighted mean is removed, and the covariance is the weighted
/// sum of outer products of the centred rows. The result is exactly symmetric.
///
/// # Errors
/// Returns error if there are no rows or the half-life is not positive.
pub fn ewm_factor_covariance(returns: &Array2<f64>, half_life: f64) -> Result<Array2<f64>, MathError> {
    let (centered, weights) = centered_with_weights(returns, half_life)?;
    let weighted = &centered * &weights.view().insert_axis(Axis(1));
    Ok(symmetrize(&weighted.t().dot(&centered)))
}

/// Exponentially weighted variance of each column of specific returns.
///
/// Same weighting as [`ewm_factor_covariance`]; returns one variance per column.
///
/// # Errors
/// Returns error if there are no rows or the half-life is not positive.
pub fn ewm_specific_variance(residuals: &Array2<f64>, half_life: f64) -> Result<Array1<f64>, MathError> {
    let (centered, weights) = centered_with_weights(residuals, half_life)?;
    Ok(centered.mapv(|c| c * c).t().dot(&weights))
}

fn centered_with_weights(data: &Array2<f64>, half_life: f64) -> Result<(Array2<f64>, Array1<f64>), MathError> {
    if data.nrows() == 0 {
        return Err(MathError::EmptyData);
    }
    if half_life <= 0.0 || !half_life.is_finite() {
        return Err(MathError::InvalidParameter(format!("half-life must be positive, got {half_life}")));
    }
    let weights = exp_weights(data.nrows(), half_life);
    let mean = data.t().dot(&weights);
    let centered = data - &mean.view().insert_axis(Axis(0));
    Ok((centered, weights))
}

/// Bias-corrected exponentially weighted standard deviation of a series, evaluated at
/// its last observation.
///
/// Uses adjusted weights `decay^(age)` with `decay = 0.5^(1 / half_life)` and the
/// unbiasing factor `(Σw)² / ((Σw)² - Σw²)`. Returns `None` with fewer than two
/// observations or a non-positive half-life.
#[must_use]
pub fn ewm_std(values: &[f64], half_life: f64) -> Option<f64> {
    if values.len() < 2 || half_life <= 0.0 || !half_life.is_finite() {
        return None;
    }
    let decay = ewm_decay(half_life);
    let n = values.len();
    let weights: Vec<f64> = (0..n).map(|i| decay.powi((n - 1 - i) as i32)).collect();

    let sum_w: f64 = weights.iter().sum();
    let sum_w2: f64 = weights.iter().map(|w| w * w).sum();
    let mean = values.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() / sum_w;
    let biased = values.iter().zip(&weights).map(|(x, w)| w * (x - mean).powi(2)).sum::<f64>() / sum_w;

    let denom = sum_w * sum_w - sum_w2;
    if denom <= 0.0 {
        return None;
    }
    Some((biased * sum_w * sum_w / denom).max(0.0).sqrt())
}

/// Sample covariance (`ddof = 1`) of the columns of a `T x K` matrix.
///
/// # Errors
/// Returns `MathError::InvalidParameter` with fewer than two rows.
pub fn sample_covariance(returns: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let t = returns.nrows();
    if t < 2 {
        return Err(MathError::InvalidParameter(format!("sample covariance needs at least 2 rows, got {t}")));
    }
    let mean = returns.mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;
    let centered = returns - &mean.view().insert_axis(Axis(0));
    Ok(symmetrize(&(centered.t().dot(&centered) / (t - 1) as f64)))
}

/// Pearson correlation of the columns of a `T x K` matrix.
///
/// A column with zero variance has zero correlation with every other column and a
/// unit diagonal entry.
///
/// # Errors
/// Returns `MathError::InvalidParameter` with fewer than two rows.
pub fn correlation_matrix(returns: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let cov = sample_covariance(returns)?;
    let k = cov.nrows();
    let std = cov.diag().mapv(f64::sqrt);
    Ok(Array2::from_shape_fn((k, k), |(i, j)| {
        if i == j {
            1.0
        } else if std[i] > 0.0 && std[j] > 0.0 {
            (cov[[i, j]] / (std[i] * std[j])).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    fn sample_returns() -> Array2<f64> {
        array![
            [0.010, -0.002, 0.004],
            [-0.004, 0.003, 0.001],
            [0.007, 0.001, -0.006],
            [0.002, -0.005, 0.002],
            [-0.011, 0.004, 0.003],
            [0.005, 0.002, -0.001],
        ]
    }

    #[rstest]
    #[case(2.0)]
    #[case(90.0)]
    fn ewm_covariance_is_symmetric(#[case] half_life: f64) {
        let cov = ewm_factor_covariance(&sample_returns(), half_life).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(cov[[i, j]], cov[[j, i]]);
            }
        }
    }

    #[test]
    fn ewm_covariance_long_half_life_approaches_population() {
        let returns = sample_returns();
        let cov = ewm_factor_covariance(&returns, 1e9).unwrap();
        let sample = sample_covariance(&returns).unwrap();
        let t = returns.nrows() as f64;
        assert_relative_eq!(cov[[0, 1]], sample[[0, 1]] * (t - 1.0) / t, epsilon = 1e-9);
    }

    #[test]
    fn ewm_specific_variance_matches_covariance_diagonal() {
        let returns = sample_returns();
        let var = ewm_specific_variance(&returns, 42.0).unwrap();
        let cov = ewm_factor_covariance(&returns, 42.0).unwrap();
        for i in 0..3 {
            assert_relative_eq!(var[i], cov[[i, i]], epsilon = 1e-15);
        }
    }

    #[test]
    fn ewm_rejects_bad_input() {
        assert!(ewm_factor_covariance(&Array2::zeros((0, 3)), 90.0).is_err());
        assert!(ewm_factor_covariance(&sample_returns(), 0.0).is_err());
    }

    #[test]
    fn ewm_std_two_points() {
        // weights (d, 1): biased var = d(a-m)^2 + (b-m)^2 over (1+d), corrected by (1+d)^2 / 2d
        let d = 0.5_f64;
        let (a, b) = (1.0, 3.0);
        let m = (d * a + b) / (1.0 + d);
        let biased = (d * (a - m).powi(2) + (b - m).powi(2)) / (1.0 + d);
        let expected = (biased * (1.0 + d).powi(2) / ((1.0 + d).powi(2) - (d * d + 1.0))).sqrt();

        assert_relative_eq!(ewm_std(&[a, b], 1.0).unwrap(), expected, epsilon = 1e-12);
        assert_eq!(ewm_std(&[1.0], 1.0), None);
    }

    #[test]
    fn ewm_std_constant_is_zero() {
        assert_relative_eq!(ewm_std(&[0.01; 50], 42.0).unwrap(), 0.0);
    }

    #[test]
    fn correlation_has_unit_diagonal() {
        let corr = correlation_matrix(&sample_returns()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(corr[[i, i]], 1.0);
        }
        assert!(corr.iter().all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn correlation_with_flat_column() {
        let returns = array![[0.01, 0.0], [0.02, 0.0], [-0.01, 0.0]];
        let corr = correlation_matrix(&returns).unwrap();
        assert_eq!(corr, array![[1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn sample_covariance_needs_two_rows() {
        assert!(sample_covariance(&array![[0.1, 0.2]]).is_err());
    }
}
