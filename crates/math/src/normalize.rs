//! Outlier clipping and standardisation of cross-sections.

use ndarray::Array1;

use crate::{MathError, stats};

/// Scale factor that makes the median absolute deviation a consistent
/// estimator of the standard deviation under normality.
pub const MAD_NORMAL_CONSISTENCY: f64 = 1.4826;

/// Default clipping width in scaled MADs.
pub const DEFAULT_N_MAD: f64 = 3.0;

/// Winsorize a cross-section to `median ± n_mad * MAD`.
///
/// The MAD is scaled by [`MAD_NORMAL_CONSISTENCY`]. NaN entries are ignored when
/// computing the bounds and passed through unchanged. When the MAD is zero the
/// input is returned as-is.
///
/// # Arguments
/// * `data` - Input array
/// * `n_mad` - Clipping width in scaled MADs (e.g. 3.0)
#[must_use]
pub fn winsorize(data: &Array1<f64>, n_mad: f64) -> Array1<f64> {
    let valid: Vec<f64> = data.iter().copied().filter(|x| !x.is_nan()).collect();
    let Some(median) = stats::median(&valid) else {
        return data.clone();
    };

    let deviations: Vec<f64> = valid.iter().map(|x| (x - median).abs()).collect();
    let mad = stats::median(&deviations).unwrap_or(0.0) * MAD_NORMAL_CONSISTENCY;
    if mad == 0.0 || !mad.is_finite() {
        return data.clone();
    }

    let lower = median - n_mad * mad;
    let upper = median + n_mad * mad;
    data.mapv(|x| if x.is_nan() { x } else { x.clamp(lower, upper) })
}

/// Standardise a cross-section to zero mean and unit standard deviation.
///
/// With `weights`, the weights are normalised to sum to one and the weighted mean
/// and weighted (population) standard deviation are used. Without weights, the plain
/// mean and sample standard deviation are used. NaN observations and NaN weights are
/// skipped in the moments and stay NaN in the output.
///
/// A zero (or undefined) standard deviation yields zeros rather than NaN.
///
/// # Errors
/// Returns `MathError::DimensionMismatch` if the weights length differs from the data.
pub fn z_score(data: &Array1<f64>, weights: Option<&Array1<f64>>) -> Result<Array1<f64>, MathError> {
    let (mean, std) = match weights {
        Some(w) => {
            if w.len() != data.len() {
                return Err(MathError::DimensionMismatch { expected: data.len(), actual: w.len() });
            }
            let total: f64 = w.iter().filter(|v| !v.is_nan()).sum();
            let pairs = || data.iter().zip(w.iter()).map(move |(x, wi)| (*x, wi / total));
            let mean: f64 = pairs().map(|(x, wi)| x * wi).filter(|v| !v.is_nan()).sum();
            let var: f64 = pairs().map(|(x, wi)| (x - mean).powi(2) * wi).filter(|v| !v.is_nan()).sum();
            (mean, var.sqrt())
        }
        None => {
            let valid: Vec<f64> = data.iter().copied().filter(|x| !x.is_nan()).collect();
            (stats::mean(&valid).unwrap_or(0.0), stats::sample_std(&valid).unwrap_or(0.0))
        }
    };

    if std > 0.0 && std.is_finite() {
        Ok(data.mapv(|x| (x - mean) / std))
    } else {
        Ok(data.mapv(|x| x * 0.0))
    }
}

/// MAD winsorization configuration and transform.
#[derive(Debug, Clone, Copy)]
pub struct Winsorizer {
    /// Clipping width in scaled MADs.
    n_mad: f64,
}

impl Winsorizer {
    /// Create a new winsorizer.
    ///
    /// # Errors
    /// Returns `MathError::InvalidParameter` if `n_mad` is not strictly positive.
    pub fn new(n_mad: f64) -> Result<Self, MathError> {
        if n_mad <= 0.0 || !n_mad.is_finite() {
            return Err(MathError::InvalidParameter(format!("n_mad must be positive, got {n_mad}")));
        }
        Ok(Self { n_mad })
    }

    /// Get the clipping width.
    #[must_use]
    pub const fn n_mad(&self) -> f64 {
        self.n_mad
    }

    /// Apply winsorization to an array.
    #[must_use]
    pub fn apply(&self, data: &Array1<f64>) -> Array1<f64> {
        winsorize(data, self.n_mad)
    }
}

impl Default for Winsorizer {
    fn default() -> Self {
        Self { n_mad: DEFAULT_N_MAD }
    }
}
