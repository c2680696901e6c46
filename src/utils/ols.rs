//! Ordinary Least Squares (OLS) regression on evaluated specials.
//!
//! Fits `y = intercept + X @ coefficients` where the columns of `X` are the
//! named columns produced by evaluating a model's special terms.

use crate::error::{ForecastError, Result};

/// OLS regression coefficients and intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct OLSResult {
    /// Regression coefficients (one per regressor).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
    /// Names of regressors in order.
    pub regressor_names: Vec<String>,
    /// Inverse of X'X including the intercept column, row-major.
    pub xtx_inv: Vec<Vec<f64>>,
}

impl OLSResult {
    /// Predict values from named regressor columns.
    ///
    /// Columns are matched by name; extra columns are ignored.
    pub fn predict(&self, regressors: &[(String, Vec<f64>)], n: usize) -> Result<Vec<f64>> {
        let cols = self.columns(regressors, n)?;
        Ok((0..n)
            .map(|obs| {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(&cols)
                        .map(|(c, x)| c * x[obs])
                        .sum::<f64>()
            })
            .collect())
    }

    /// Leverage term `x' (X'X)^-1 x` of each observation.
    pub fn leverage(&self, regressors: &[(String, Vec<f64>)], n: usize) -> Result<Vec<f64>> {
        let cols = self.columns(regressors, n)?;
        Ok((0..n)
            .map(|obs| {
                let x: Vec<f64> = std::iter::once(1.0)
                    .chain(cols.iter().map(|c| c[obs]))
                    .collect();
                let mut total = 0.0;
                for i in 0..x.len() {
                    for j in 0..x.len() {
                        total += x[i] * self.xtx_inv[i][j] * x[j];
                    }
                }
                total
            })
            .collect())
    }

    /// Get the number of regressors.
    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }

    fn columns<'a>(&self, regressors: &'a [(String, Vec<f64>)], n: usize) -> Result<Vec<&'a [f64]>> {
        self.regressor_names
            .iter()
            .map(|name| {
                let values = regressors
                    .iter()
                    .find(|(col, _)| col == name)
                    .map(|(_, v)| v.as_slice())
                    .ok_or_else(|| ForecastError::MissingVariable(name.clone()))?;
                if values.len() != n {
                    return Err(ForecastError::DimensionMismatch {
                        expected: n,
                        got: values.len(),
                    });
                }
                Ok(values)
            })
            .collect()
    }
}

/// Fit OLS regression: y = intercept + X @ coefficients
///
/// Uses Cholesky decomposition to solve the normal equations.
pub fn ols_fit(y: &[f64], regressors: &[(String, Vec<f64>)]) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let k = regressors.len();
    for (_, values) in regressors {
        if values.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: values.len(),
            });
        }
    }
    if n < k + 1 {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    // Design matrix has k+1 columns: [1, x1, x2, ...]
    let num_params = k + 1;
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];

    for obs in 0..n {
        let x: Vec<f64> = std::iter::once(1.0)
            .chain(regressors.iter().map(|(_, v)| v[obs]))
            .collect();
        for i in 0..num_params {
            xty[i] += x[i] * y[obs];
            for j in 0..num_params {
                xtx[i][j] += x[i] * x[j];
            }
        }
    }

    // Small ridge on the diagonal for numerical stability
    for i in 0..num_params {
        xtx[i][i] += 1e-8;
    }

    let not_pd = || {
        ForecastError::InvalidParameter("OLS regression failed: matrix not positive definite".into())
    };
    let l = cholesky(&xtx).ok_or_else(not_pd)?;
    let beta = cholesky_solve(&l, &xty);

    let mut xtx_inv = vec![vec![0.0; num_params]; num_params];
    for j in 0..num_params {
        let mut e = vec![0.0; num_params];
        e[j] = 1.0;
        let col = cholesky_solve(&l, &e);
        for i in 0..num_params {
            xtx_inv[i][j] = col[i];
        }
    }

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        regressor_names: regressors.iter().map(|(name, _)| name.clone()).collect(),
        xtx_inv,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `L L' x = b` given the Cholesky factor `L`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn col(name: &str, values: Vec<f64>) -> (String, Vec<f64>) {
        (name.to_string(), values)
    }

    #[test]
    fn ols_fit_simple_linear() {
        // y = 2 + 3*x
        let y = vec![5.0, 8.0, 11.0, 14.0, 17.0];
        let result = ols_fit(&y, &[col("x", vec![1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();

        assert_relative_eq!(result.intercept, 2.0, epsilon = 1e-6);
        assert_eq!(result.num_regressors(), 1);
        assert_relative_eq!(result.coefficients[0], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn ols_fit_multiple_regressors() {
        // y = 1 + 2*x1 + 3*x2
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = vec![0.5, 2.5, 1.0, 3.0, 1.5, 3.5, 2.0, 4.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(&x2)
            .map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b)
            .collect();

        let result = ols_fit(&y, &[col("x1", x1.clone()), col("x2", x2.clone())]).unwrap();
        assert_relative_eq!(result.intercept, 1.0, epsilon = 1e-5);
        assert_relative_eq!(result.coefficients[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(result.coefficients[1], 3.0, epsilon = 1e-5);

        let pred = result
            .predict(&[col("x2", vec![1.0]), col("x1", vec![1.0])], 1)
            .unwrap();
        assert_relative_eq!(pred[0], 6.0, epsilon = 1e-5);
    }

    #[test]
    fn ols_without_regressors_is_the_mean() {
        let result = ols_fit(&[1.0, 2.0, 3.0], &[]).unwrap();
        assert_relative_eq!(result.intercept, 2.0, epsilon = 1e-6);
        assert_eq!(result.predict(&[], 2).unwrap().len(), 2);
        // x'(X'X)^-1 x = 1/n for the intercept-only model
        assert_relative_eq!(result.leverage(&[], 1).unwrap()[0], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn predict_reports_missing_regressor() {
        let result = ols_fit(&[1.0, 2.0, 4.0], &[col("x", vec![1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(
            result.predict(&[], 1),
            Err(ForecastError::MissingVariable("x".to_string()))
        );
    }

    #[test]
    fn ols_rejects_bad_dimensions() {
        assert!(ols_fit(&[], &[]).is_err());
        assert!(matches!(
            ols_fit(&[1.0, 2.0], &[col("x", vec![1.0])]),
            Err(ForecastError::DimensionMismatch { .. })
        ));
    }
}
