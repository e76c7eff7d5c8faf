//! Weighted ridge regression used as the local surrogate model.
//!
//! Minimises `Σ wᵢ (yᵢ - b - xᵢ·β)² + α‖β‖²` with an unpenalised intercept by
//! centring on weighted means and solving the normal equations via Cholesky.

use ndarray::{s, Array1, Array2, ArrayView2, Axis};

use crate::scoring::{ScoringError, ScoringResult};

#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl RidgeFit {
    /// Predictions for rows already restricted to the fitted columns.
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }
}

/// Fits on the columns of `x` listed in `columns`.
pub fn fit_weighted_ridge(
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
    columns: &[usize],
    alpha: f64,
) -> ScoringResult<RidgeFit> {
    let w_sum = weights.sum();
    if w_sum <= 0.0 || !w_sum.is_finite() {
        return Err(ScoringError::Numeric(
            "surrogate sample weights sum to zero".to_string(),
        ));
    }

    let selected = x.select(Axis(1), columns);
    let x_mean = selected.t().dot(weights) / w_sum;
    let y_mean = weights.dot(y) / w_sum;

    let centred = &selected - &x_mean;
    let y_centred = y - y_mean;
    let weighted = &centred * &weights.view().insert_axis(Axis(1));

    // gram = Xcᵀ W Xc + αI, rhs = Xcᵀ W yc
    let gram = weighted.t().dot(&centred) + Array2::<f64>::eye(columns.len()) * alpha;
    let rhs = weighted.t().dot(&y_centred);

    let coefficients = cholesky_solve(gram, &rhs)?;
    let intercept = y_mean - x_mean.dot(&coefficients);

    Ok(RidgeFit {
        coefficients,
        intercept,
    })
}

/// Weighted coefficient of determination of `fit` over the given columns.
pub fn weighted_r2(
    fit: &RidgeFit,
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: &Array1<f64>,
    columns: &[usize],
) -> f64 {
    let y_mean = weights.dot(y) / weights.sum();
    let predictions = fit.predict(x.select(Axis(1), columns).view());

    let residual = weights.dot(&(y - &predictions).mapv(|r| r * r));
    let total = weights.dot(&y.mapv(|v| (v - y_mean).powi(2)));

    if total == 0.0 {
        return if residual == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - residual / total
}

/// Solves `A x = b` for symmetric positive-definite `A`, overwriting `A`
/// with its lower Cholesky factor.
fn cholesky_solve(mut a: Array2<f64>, b: &Array1<f64>) -> ScoringResult<Array1<f64>> {
    let n = b.len();
    for j in 0..n {
        let row_j = a.row(j);
        let diag = a[[j, j]] - row_j.slice(s![..j]).dot(&row_j.slice(s![..j]));
        if diag <= 0.0 || !diag.is_finite() {
            return Err(ScoringError::Numeric(
                "surrogate system is not positive definite".to_string(),
            ));
        }
        let l_jj = diag.sqrt();
        a[[j, j]] = l_jj;
        for i in (j + 1)..n {
            let s = a[[i, j]]
                - a.slice(s![i, ..j])
                    .dot(&a.slice(s![j, ..j]));
            a[[i, j]] = s / l_jj;
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let s = a.slice(s![i, ..i]).dot(&z.slice(s![..i]));
        z[i] = (b[i] - s) / a[[i, i]];
    }
    // Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let s = a
            .slice(s![(i + 1).., i])
            .dot(&x.slice(s![(i + 1)..]));
        x[i] = (z[i] - s) / a[[i, i]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relationship() {
        // y = 1 + 2*x0 - 3*x1
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
        let y = x.map_axis(Axis(1), |r| 1.0 + 2.0 * r[0] - 3.0 * r[1]);
        let w = Array1::ones(x.nrows());
        let fit = fit_weighted_ridge(&x, &y, &w, &[0, 1], 1e-9).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((fit.coefficients[1] + 3.0).abs() < 1e-6);
        assert!((fit.intercept - 1.0).abs() < 1e-6);
        assert!((weighted_r2(&fit, &x, &y, &w, &[0, 1]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = array![[0.0], [1.0], [0.0], [1.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let w = Array1::ones(4);
        let loose = fit_weighted_ridge(&x, &y, &w, &[0], 0.01).unwrap();
        let tight = fit_weighted_ridge(&x, &y, &w, &[0], 10.0).unwrap();
        assert!(tight.coefficients[0].abs() < loose.coefficients[0].abs());
    }

    #[test]
    fn test_zero_weight_rows_are_ignored() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0, 100.0];
        let w = array![1.0, 1.0, 1.0, 0.0];
        let fit = fit_weighted_ridge(&x, &y, &w, &[0], 1e-9).unwrap();
        assert!((fit.coefficients[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_column_subset() {
        let x = array![[5.0, 0.0], [7.0, 1.0], [1.0, 2.0]];
        let y = array![0.0, 1.0, 2.0];
        let w = Array1::ones(3);
        let fit = fit_weighted_ridge(&x, &y, &w, &[1], 1e-9).unwrap();
        assert_eq!(fit.coefficients.len(), 1);
        assert!((fit.coefficients[0] - 1.0).abs() < 1e-6);
        assert!((fit.predict(array![[3.0]].view())[0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weights_rejected() {
        let err = fit_weighted_ridge(&array![[1.0]], &array![1.0], &array![0.0], &[0], 1.0)
            .unwrap_err();
        assert!(matches!(err, ScoringError::Numeric(_)));
    }

    #[test]
    fn test_cholesky_solves_known_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let x = cholesky_solve(a, &array![8.0, 7.0]).unwrap();
        assert!((x[0] - 1.25).abs() < 1e-12);
        assert!((x[1] - 1.5).abs() < 1e-12);
        assert!(cholesky_solve(array![[0.0]], &array![1.0]).is_err());
    }
}
