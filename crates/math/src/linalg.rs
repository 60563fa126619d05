//! Linear algebra operations for factor estimation.

use ndarray::{Array1, Array2, Axis, s};

use crate::MathError;

/// Pivot magnitude below which a system is treated as singular.
const SINGULAR_PIVOT: f64 = 1e-14;

/// Result of the industry-constrained weighted least squares regression.
#[derive(Debug, Clone)]
pub struct ConstrainedWlsResult {
    /// Factor returns, one per design-matrix column.
    pub factor_returns: Array1<f64>,
    /// Specific (idiosyncratic) returns `y - X f`, one per observation.
    pub specific_returns: Array1<f64>,
    /// Lagrange multiplier of the constraint.
    pub multiplier: f64,
}

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues in descending order.
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors as columns, in the order of `eigenvalues`.
    pub eigenvectors: Array2<f64>,
}

impl EigenDecomposition {
    /// Rebuild `V diag(values) V^T` from the eigenvectors and the given eigenvalues.
    #[must_use]
    pub fn reconstruct(&self, values: &Array1<f64>) -> Array2<f64> {
        let scaled = &self.eigenvectors * &values.view().insert_axis(Axis(0));
        scaled.dot(&self.eigenvectors.t())
    }
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
///
/// # Errors
/// Returns error if `a` is not square, dimensions mismatch, or the matrix is singular.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val < SINGULAR_PIVOT || max_val.is_nan() {
            return Err(MathError::LinearAlgebra(
                "matrix is singular or nearly singular".to_string(),
            ));
        }

        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Weighted least squares subject to one linear equality constraint `c^T f = 0`.
///
/// Solves the bordered (KKT) system
///
/// ```text
/// [X^T W X  c] [f]   [X^T W y]
/// [c^T      0] [λ] = [   0   ]
/// ```
///
/// where `W` is the diagonal of `weights` normalised to sum to one. The weighting is
/// applied by scaling rows of `X`; no `n x n` matrix is formed. For the factor model,
/// `c` holds each industry's market-cap share at the industry columns and zero
/// elsewhere, which makes the cap-weighted industry returns sum to zero.
///
/// # Arguments
/// * `y` - Excess returns (n,)
/// * `x` - Design matrix (n x k)
/// * `weights` - Regression weights (n,), typically sqrt(market cap)
/// * `constraint` - Constraint vector `c` (k,)
///
/// # Errors
/// Returns error if dimensions mismatch, the weights sum to zero, or the system is singular.
pub fn constrained_wls(
    y: &Array1<f64>,
    x: &Array2<f64>,
    weights: &Array1<f64>,
    constraint: &Array1<f64>,
) -> Result<ConstrainedWlsResult, MathError> {
    let n = y.len();
    let k = x.ncols();

    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if weights.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: weights.len() });
    }
    if constraint.len() != k {
        return Err(MathError::DimensionMismatch { expected: k, actual: constraint.len() });
    }
    if n == 0 || k == 0 {
        return Err(MathError::EmptyData);
    }

    let total = weights.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(MathError::InvalidParameter("regression weights must have a finite, non-zero sum".to_string()));
    }
    let w = weights / total;

    // Scale rows of X by the weights
    let xw = x * &w.view().insert_axis(Axis(1));

    let mut kkt = Array2::zeros((k + 1, k + 1));
    kkt.slice_mut(s![..k, ..k]).assign(&xw.t().dot(x));
    kkt.slice_mut(s![..k, k]).assign(constraint);
    kkt.slice_mut(s![k, ..k]).assign(constraint);

    let mut rhs = Array1::zeros(k + 1);
    rhs.slice_mut(s![..k]).assign(&xw.t().dot(y));

    let solution = solve_linear_system(&kkt, &rhs)?;
    let factor_returns = solution.slice(s![..k]).to_owned();
    let specific_returns = y - &x.dot(&factor_returns);

    Ok(ConstrainedWlsResult { factor_returns, specific_returns, multiplier: solution[k] })
}

/// Lower-triangular Cholesky factor `L` with `A = L L^T`.
///
/// # Errors
/// Returns `MathError::NotPositiveDefinite` if a pivot is not strictly positive.
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|m| l[[i, m]] * l[[j, m]]).sum();
            if i == j {
                let pivot = a[[i, i]] - sum;
                if pivot <= 0.0 || pivot.is_nan() {
                    return Err(MathError::NotPositiveDefinite { pivot: i, value: pivot });
                }
                l[[i, j]] = pivot.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Ok(l)
}

/// Jacobi eigenvalue decomposition of a symmetric matrix.
///
/// Rotates away the largest off-diagonal element until every off-diagonal element is
/// below `tolerance` or `max_rotations` is reached.
///
/// # Errors
/// Returns error if the matrix is not square or contains non-finite values.
pub fn jacobi_eigen(
    matrix: &Array2<f64>,
    max_rotations: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, MathError> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: matrix.ncols() });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::NumericalInstability("matrix contains NaN or Inf".to_string()));
    }

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    if n > 1 {
        for _ in 0..max_rotations {
            let (p, q) = largest_off_diagonal(&a);
            if a[[p, q]].abs() < tolerance {
                break;
            }
            let (cos, sin) = rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
            rotate(&mut a, &mut v, p, q, cos, sin);
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let eigenvalues = order.iter().map(|&i| a[[i, i]]).collect();
    let mut eigenvectors = Array2::zeros((n, n));
    for (col, &src) in order.iter().enumerate() {
        eigenvectors.column_mut(col).assign(&v.column(src));
    }

    Ok(EigenDecomposition { eigenvalues, eigenvectors })
}

fn largest_off_diagonal(a: &Array2<f64>) -> (usize, usize) {
    let n = a.nrows();
    let (mut p, mut q, mut max) = (0, 1, 0.0);
    for i in 0..n {
        for j in (i + 1)..n {
            if a[[i, j]].abs() > max {
                max = a[[i, j]].abs();
                p = i;
                q = j;
            }
        }
    }
    (p, q)
}

fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq == 0.0 {
        return (1.0, 0.0);
    }
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let cos = 1.0 / (1.0 + t * t).sqrt();
    (cos, t * cos)
}

fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, cos: f64, sin: f64) {
    let n = a.nrows();
    let (app, aqq, apq) = (a[[p, p]], a[[q, q]], a[[p, q]]);

    a[[p, p]] = cos * cos * app - 2.0 * cos * sin * apq + sin * sin * aqq;
    a[[q, q]] = sin * sin * app + 2.0 * cos * sin * apq + cos * cos * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let (aip, aiq) = (a[[i, p]], a[[i, q]]);
            a[[i, p]] = cos * aip - sin * aiq;
            a[[p, i]] = a[[i, p]];
            a[[i, q]] = sin * aip + cos * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let (vip, viq) = (v[[i, p]], v[[i, q]]);
        v[[i, p]] = cos * vip - sin * viq;
        v[[i, q]] = sin * vip + cos * viq;
    }
}

/// Nearest positive-definite correlation matrix by eigenvalue clipping.
///
/// The input is symmetrised, eigenvalues below `min_eigenvalue` are raised to it and
/// the matrix is rebuilt. Clipping inflates the diagonal, so the result is rescaled by
/// `D^-1/2 M D^-1/2` to restore a unit diagonal without losing definiteness.
///
/// # Errors
/// Returns error if the matrix is not square or not finite.
pub fn nearest_correlation(corr: &Array2<f64>, min_eigenvalue: f64) -> Result<Array2<f64>, MathError> {
    let n = corr.nrows();
    if corr.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: corr.ncols() });
    }
    let sym = symmetrize(corr);
    let decomp = jacobi_eigen(&sym, 100 * n.max(1) * n.max(1), 1e-12)?;
    let clipped = decomp.eigenvalues.mapv(|v| v.max(min_eigenvalue));

    let rebuilt = symmetrize(&decomp.reconstruct(&clipped));
    let scale = rebuilt.diag().mapv(|d| if d > 0.0 { 1.0 / d.sqrt() } else { 1.0 });
    let mut fixed = Array2::from_shape_fn((n, n), |(i, j)| rebuilt[[i, j]] * scale[i] * scale[j]);
    fixed.diag_mut().fill(1.0);
    Ok(fixed)
}

/// `(A + A^T) / 2`.
#[must_use]
pub fn symmetrize(a: &Array2<f64>) -> Array2<f64> {
    (a + &a.t()) / 2.0
}
