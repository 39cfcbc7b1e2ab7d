//! Ordinary least squares.
//!
//! Classical (non-robust) inference: `σ̂² = SSR / (n − k)`, standard errors
//! from the diagonal of `σ̂² (X'X)⁻¹`, two-sided Student-t p-values with
//! `n − k` degrees of freedom, centred R².

use crate::error::{ArError, Result};
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pivot magnitude below which the unit-diagonal scaled `X'X` is treated as
/// singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Coefficients, one per design column
    pub params: Array1<f64>,
    /// Standard errors of the coefficients
    pub std_errors: Array1<f64>,
    /// t statistics
    pub t_values: Array1<f64>,
    /// Two-sided p-values
    pub p_values: Array1<f64>,
    /// Centred coefficient of determination, undefined for a constant response
    pub r_squared: Option<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    /// Number of observations
    pub n_obs: usize,
    /// Residual degrees of freedom
    pub df_resid: usize,
}

/// Fit `y = X β + ε` by least squares.
///
/// Requires more rows than columns. Fails with [`ArError::SingularDesign`]
/// when `X'X` cannot be inverted. A response that the design reproduces
/// exactly gives zero standard errors; a zero coefficient then has an
/// undefined (NaN) t statistic and p-value.
pub fn fit_ols(x: &Array2<f64>, y: &Array1<f64>) -> Result<OlsFit> {
    let (n, k) = x.dim();
    if y.len() != n {
        return Err(ArError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if n <= k {
        return Err(ArError::InsufficientData {
            required: k + 1,
            actual: n,
        });
    }

    let xtx = x.t().dot(x);
    let xtx_inv = invert(&xtx)?;
    let params = xtx_inv.dot(&x.t().dot(y));

    let residuals = y - &x.dot(&params);
    let ssr = residuals.dot(&residuals);
    let y_mean = y.mean().unwrap_or(0.0);
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let df_resid = n - k;
    let sigma2 = ssr / df_resid as f64;
    let std_errors = xtx_inv.diag().mapv(|v| (sigma2 * v).max(0.0).sqrt());

    let t_dist = StudentsT::new(0.0, 1.0, df_resid as f64)
        .map_err(|e| ArError::Distribution(e.to_string()))?;

    let t_values: Array1<f64> = params
        .iter()
        .zip(std_errors.iter())
        .map(|(b, se)| t_statistic(*b, *se))
        .collect();
    let p_values = t_values.mapv(|t| {
        if t.is_nan() {
            f64::NAN
        } else if t.is_infinite() {
            0.0
        } else {
            (2.0 * t_dist.sf(t.abs())).min(1.0)
        }
    });

    Ok(OlsFit {
        params,
        std_errors,
        t_values,
        p_values,
        r_squared: (tss > 0.0).then(|| 1.0 - ssr / tss),
        ssr,
        n_obs: n,
        df_resid,
    })
}

fn t_statistic(coefficient: f64, std_error: f64) -> f64 {
    if std_error > 0.0 {
        coefficient / std_error
    } else if coefficient == 0.0 {
        f64::NAN
    } else {
        coefficient.signum() * f64::INFINITY
    }
}

/// Invert a square matrix with a positive diagonal.
///
/// The matrix is first scaled to a unit diagonal, `B = D^-1/2 A D^-1/2`, so
/// the singularity test does not depend on the units of the regressors. Then
/// `A^-1 = D^-1/2 B^-1 D^-1/2`.
fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ArError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let diag = matrix.diag();
    if diag.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
        return Err(ArError::SingularDesign);
    }
    let inv_sqrt = diag.mapv(|d| 1.0 / d.sqrt());
    let scaled = Array2::from_shape_fn((n, n), |(i, j)| {
        matrix[[i, j]] * inv_sqrt[i] * inv_sqrt[j]
    });

    let inv = gauss_jordan(&scaled)?;
    Ok(Array2::from_shape_fn((n, n), |(i, j)| {
        inv[[i, j]] * inv_sqrt[i] * inv_sqrt[j]
    }))
}

/// Gauss-Jordan elimination with partial pivoting.
fn gauss_jordan(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        let pivot = a[[pivot_row, col]];
        if !pivot.is_finite() || pivot.abs() < PIVOT_TOLERANCE {
            return Err(ArError::SingularDesign);
        }

        if pivot_row != col {
            for j in 0..n {
                a.swap([col, j], [pivot_row, j]);
                inv.swap([col, j], [pivot_row, j]);
            }
        }

        for j in 0..n {
            a[[col, j]] /= pivot;
            inv[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[[row, j]] -= factor * a[[col, j]];
                inv[[row, j]] -= factor * inv[[col, j]];
            }
        }
    }

    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn with_intercept(x: &[f64]) -> Array2<f64> {
        let mut design = Array2::ones((x.len(), 2));
        for (i, v) in x.iter().enumerate() {
            design[[i, 1]] = *v;
        }
        design
    }

    #[test]
    fn test_simple_regression() {
        let x = with_intercept(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = array![2.2, 4.1, 6.1, 7.9, 10.2];

        let fit = fit_ols(&x, &y).unwrap();

        assert_relative_eq!(fit.params[0], 0.16, epsilon = 1e-10);
        assert_relative_eq!(fit.params[1], 1.98, epsilon = 1e-10);
        assert_relative_eq!(fit.std_errors[0], 0.143_294_568_401_363_84, epsilon = 1e-10);
        assert_relative_eq!(fit.std_errors[1], 0.043_204_937_989_385_53, epsilon = 1e-10);
        assert_relative_eq!(fit.t_values[1], 45.828_094_938_741_51, epsilon = 1e-8);
        assert_relative_eq!(fit.r_squared.unwrap(), 0.998_573_611_818_644_9, epsilon = 1e-10);
        assert!(fit.p_values[1] < 1e-4);
        assert!(fit.p_values[0] > 0.05);
        assert_eq!(fit.n_obs, 5);
        assert_eq!(fit.df_resid, 3);
    }

    #[test]
    fn test_singular_design() {
        // Regressor is a copy of the intercept
        let x = with_intercept(&[1.0, 1.0, 1.0, 1.0]);
        let y = array![1.0, 2.0, 3.0, 4.0];

        assert!(matches!(fit_ols(&x, &y), Err(ArError::SingularDesign)));
    }

    #[test]
    fn test_constant_response_is_fitted_exactly() {
        let x = with_intercept(&[1.0, 0.0, 0.0, 0.0, 0.0]);
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0];

        let fit = fit_ols(&x, &y).unwrap();

        assert_eq!(fit.params[0], 0.0);
        assert_eq!(fit.params[1], 0.0);
        assert_eq!(fit.ssr, 0.0);
        assert_eq!(fit.r_squared, None);
        assert!(fit.t_values[1].is_nan());
        assert!(fit.p_values[1].is_nan());
    }

    #[test]
    fn test_constant_nonzero_response() {
        let x = with_intercept(&[1.0, 2.0, 0.5, 3.0]);
        let y = array![3.0, 3.0, 3.0, 3.0];

        let fit = fit_ols(&x, &y).unwrap();

        assert_relative_eq!(fit.params[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.params[1], 0.0, epsilon = 1e-12);
        assert_eq!(fit.r_squared, None);
    }

    #[test]
    fn test_singular_check_is_scale_free() {
        let xs = [0.3, -1.2, 0.8, 2.1, -0.4, 1.5];
        let ys = [0.1, -0.5, 0.6, 1.2, -0.1, 0.7];
        let unit = fit_ols(&with_intercept(&xs), &Array1::from_vec(ys.to_vec())).unwrap();

        for scale in [1e-8, 1e-12, 1e8] {
            let x: Vec<f64> = xs.iter().map(|v| v * scale).collect();
            let y = Array1::from_iter(ys.iter().map(|v| v * scale));
            let fit = fit_ols(&with_intercept(&x), &y).unwrap();

            assert_relative_eq!(fit.params[1], unit.params[1], max_relative = 1e-8);
            assert_relative_eq!(fit.p_values[1], unit.p_values[1], max_relative = 1e-6);
        }
    }

    #[test]
    fn test_too_few_rows() {
        let x = with_intercept(&[1.0, 2.0]);
        let y = array![1.0, 2.0];

        assert!(matches!(
            fit_ols(&x, &y),
            Err(ArError::InsufficientData { required: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_invert() {
        let m = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = invert(&m).unwrap();
        let identity = m.dot(&inv);

        assert_relative_eq!(identity[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[0, 1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[1, 0]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(identity[[1, 1]], 1.0, epsilon = 1e-12);
    }
}
