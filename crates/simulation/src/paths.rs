//! Monte Carlo paths of portfolio value.
//!
//! Both generators return a `simulations x (days + 1)` matrix whose first column is
//! today's value `current_prices . shares`.

use equirisk_math::{MathError, cholesky, correlation_matrix, nearest_correlation};
use ndarray::{Array1, Array2, Axis, Zip};
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

/// Eigenvalue floor when repairing a correlation matrix that is not positive definite.
pub const MIN_CORRELATION_EIGENVALUE: f64 = 1e-8;

fn check_len(expected: usize, actual: usize) -> Result<(), MathError> {
    if expected == actual { Ok(()) } else { Err(MathError::DimensionMismatch { expected, actual }) }
}

/// Resample historical return rows with replacement and compound them from today's
/// closes.
///
/// Every simulated day draws one whole row of `historical_returns` (`T x N`), which keeps
/// the cross-sectional dependence of the holdings.
///
/// # Errors
/// Returns error if the shapes disagree or there are no historical rows.
pub fn bootstrap_paths<R: Rng>(
    current_prices: &Array1<f64>,
    historical_returns: &Array2<f64>,
    shares: &Array1<f64>,
    days: usize,
    num_simulations: usize,
    rng: &mut R,
) -> Result<Array2<f64>, MathError> {
    let n = current_prices.len();
    check_len(n, historical_returns.ncols())?;
    check_len(n, shares.len())?;
    let t = historical_returns.nrows();
    if t == 0 {
        return Err(MathError::EmptyData);
    }

    let initial = current_prices.dot(shares);
    let mut values = Array2::zeros((num_simulations, days + 1));
    let mut prices = Array1::<f64>::zeros(n);
    for mut path in values.rows_mut() {
        prices.assign(current_prices);
        path[0] = initial;
        for value in path.iter_mut().skip(1) {
            let sampled = historical_returns.row(rng.gen_range(0..t));
            prices.zip_mut_with(&sampled, |p, r| *p *= 1.0 + r);
            *value = prices.dot(shares);
        }
    }
    Ok(values)
}

/// Per-stock inputs of correlated geometric Brownian motion.
#[derive(Debug, Clone, PartialEq)]
pub struct GbmParameters {
    /// Mean daily log return.
    pub mu: Array1<f64>,
    /// Sample standard deviation of daily log returns.
    pub sigma: Array1<f64>,
    /// Correlation of daily simple returns.
    pub correlation: Array2<f64>,
}

impl GbmParameters {
    /// Estimate from a `T x N` matrix of simple returns.
    ///
    /// # Errors
    /// Returns `MathError::InvalidParameter` with fewer than two rows.
    pub fn estimate(returns: &Array2<f64>) -> Result<Self, MathError> {
        let correlation = correlation_matrix(returns)?;
        let log_returns = returns.mapv(f64::ln_1p);
        let mu = log_returns.mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;
        let sigma = log_returns.std_axis(Axis(0), 1.0);
        Ok(Self { mu, sigma, correlation })
    }
}

/// Lower Cholesky factor of a correlation matrix, clipping eigenvalues first when the
/// matrix is not positive definite.
///
/// # Errors
/// Returns error if the matrix is not square or the repaired matrix still fails.
pub fn correlation_factor(correlation: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    match cholesky(correlation) {
        Err(MathError::NotPositiveDefinite { pivot, value }) => {
            debug!(pivot, value, "correlation not positive definite, clipping eigenvalues");
            cholesky(&nearest_correlation(correlation, MIN_CORRELATION_EIGENVALUE)?)
        }
        result => result,
    }
}

/// Evolve log-normal prices with correlated daily shocks.
///
/// Each day every stock moves by `exp(mu - sigma^2 / 2 + sigma * e)` where `e = L z`,
/// `z` standard normal and `L` the Cholesky factor of the correlation.
///
/// # Errors
/// Returns error if the shapes disagree or the correlation cannot be factorised.
pub fn gbm_paths<R: Rng>(
    current_prices: &Array1<f64>,
    params: &GbmParameters,
    shares: &Array1<f64>,
    days: usize,
    num_simulations: usize,
    rng: &mut R,
) -> Result<Array2<f64>, MathError> {
    let n = current_prices.len();
    check_len(n, params.mu.len())?;
    check_len(n, params.sigma.len())?;
    check_len(n, params.correlation.nrows())?;
    check_len(n, shares.len())?;

    let lower = correlation_factor(&params.correlation)?;
    let drift = &params.mu - &params.sigma.mapv(|s| 0.5 * s * s);

    let initial = current_prices.dot(shares);
    let mut values = Array2::zeros((num_simulations, days + 1));
    let mut prices = Array1::<f64>::zeros(n);
    let mut z = Array1::<f64>::zeros(n);
    for mut path in values.rows_mut() {
        prices.assign(current_prices);
        path[0] = initial;
        for value in path.iter_mut().skip(1) {
            for draw in &mut z {
                *draw = rng.sample(StandardNormal);
            }
            let shocks = lower.dot(&z);
            Zip::from(&mut prices)
                .and(&drift)
                .and(&params.sigma)
                .and(&shocks)
                .for_each(|p, &d, &s, &e| *p *= (d + s * e).exp());
            *value = prices.dot(shares);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn bootstrap_starts_at_current_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let returns = array![[0.01, -0.02], [0.0, 0.03], [-0.01, 0.01]];
        let paths = bootstrap_paths(&array![10.0, 20.0], &returns, &array![3.0, 1.0], 5, 50, &mut rng).unwrap();

        assert_eq!(paths.dim(), (50, 6));
        assert!(paths.column(0).iter().all(|v| *v == 50.0));
        assert!(paths.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn bootstrap_of_a_constant_return_compounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let returns = array![[0.01], [0.01]];
        let paths = bootstrap_paths(&array![100.0], &returns, &array![2.0], 3, 4, &mut rng).unwrap();
        for path in paths.rows() {
            assert_relative_eq!(path[3], 200.0 * 1.01f64.powi(3), epsilon = 1e-9);
        }
    }

    #[test]
    fn bootstrap_rejects_mismatched_shares() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = bootstrap_paths(&array![1.0, 2.0], &array![[0.0, 0.0]], &array![1.0], 2, 2, &mut rng).unwrap_err();
        assert!(matches!(err, MathError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn seeded_runs_repeat() {
        let returns = array![[0.01, -0.02], [0.0, 0.03], [-0.01, 0.01]];
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            bootstrap_paths(&array![10.0, 20.0], &returns, &array![1.0, 1.0], 10, 20, &mut rng).unwrap()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn estimates_log_return_moments() {
        let returns = array![[0.01, 0.02], [-0.01, 0.0], [0.02, -0.01], [0.0, 0.01]];
        let params = GbmParameters::estimate(&returns).unwrap();
        let logs: Vec<f64> = returns.column(0).iter().map(|r| (1.0 + r).ln()).collect();
        let mean = logs.iter().sum::<f64>() / 4.0;
        assert_relative_eq!(params.mu[0], mean, epsilon = 1e-12);
        assert_relative_eq!(params.correlation[[0, 0]], 1.0);
        assert_relative_eq!(params.correlation[[0, 1]], params.correlation[[1, 0]]);
    }

    #[test]
    fn zero_volatility_gbm_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = GbmParameters { mu: array![0.001], sigma: array![0.0], correlation: array![[1.0]] };
        let paths = gbm_paths(&array![50.0], &params, &array![10.0], 4, 8, &mut rng).unwrap();
        for path in paths.rows() {
            assert_relative_eq!(path[4], 500.0 * (0.004f64).exp(), epsilon = 1e-9);
        }
    }

    #[test]
    fn singular_correlation_is_repaired() {
        let corr = array![[1.0, 1.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(cholesky(&corr).is_err());
        let lower = correlation_factor(&corr).unwrap();
        let rebuilt = lower.dot(&lower.t());
        for i in 0..3 {
            assert_relative_eq!(rebuilt[[i, i]], 1.0, epsilon = 1e-6);
        }
        assert_relative_eq!(rebuilt[[0, 1]], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn gbm_paths_stay_positive() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = GbmParameters {
            mu: array![0.0005, 0.0002],
            sigma: array![0.02, 0.015],
            correlation: array![[1.0, 0.4], [0.4, 1.0]],
        };
        let paths = gbm_paths(&array![100.0, 40.0], &params, &array![1.0, 5.0], 30, 200, &mut rng).unwrap();
        assert_eq!(paths.dim(), (200, 31));
        assert!(paths.iter().all(|v| v.is_finite() && *v > 0.0));
    }
}
