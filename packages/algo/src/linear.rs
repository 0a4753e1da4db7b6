//! Ordinary least squares regression with intercept.
//!
//! The intercept is handled by centering: the coefficients solve the normal
//! equations of the centered design, `(Xc^T Xc + λI) w = Xc^T yc`, through a
//! Cholesky factorization, and `b = ȳ - w·x̄`.

use serde::{Deserialize, Serialize};

use crate::matrix::{cholesky_decompose, rank1_update_matrix, solve_cholesky, vec_add_scaled};
use crate::sanitize::{sanitize_feature_vector, sanitize_gram};
use crate::types::RIDGE_LAMBDA;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        if n == 0 {
            return Self::default();
        }
        let d = x[0].len();

        let x_mean: Vec<f64> = (0..d)
            .map(|j| x[..n].iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = y[..n].iter().sum::<f64>() / n as f64;

        let mut gram = vec![0.0; d * d];
        let mut moment = vec![0.0; d];
        let mut centered = vec![0.0; d];
        for (row, &target) in x[..n].iter().zip(y[..n].iter()) {
            for j in 0..d {
                centered[j] = row[j] - x_mean[j];
            }
            sanitize_feature_vector(&mut centered);
            rank1_update_matrix(&mut gram, &centered, d);
            vec_add_scaled(&mut moment, &centered, target - y_mean);
        }

        sanitize_gram(&mut gram, d, RIDGE_LAMBDA);
        let l = cholesky_decompose(&gram, d, RIDGE_LAMBDA);
        let coefficients = solve_cholesky(&l, &moment, d);

        let intercept = y_mean
            - coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(w, m)| w * m)
                .sum::<f64>();

        Self {
            coefficients,
            intercept,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    pub fn is_fitted(&self) -> bool {
        !self.coefficients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_linear_relation() {
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, (i * i % 7) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let model = LinearRegression::fit(&x, &y);

        assert!((model.intercept - 3.0).abs() < 1e-4);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-4);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-4);
        assert!((model.predict_row(&[10.0, 1.0]) - 22.5).abs() < 1e-3);
    }

    #[test]
    fn test_constant_feature_does_not_break_fit() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 1.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| r[0] * 0.5).collect();
        let model = LinearRegression::fit(&x, &y);
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
        assert!((model.predict_row(&[4.0, 1.0]) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_fit_predicts_zero() {
        let model = LinearRegression::fit(&[], &[]);
        assert!(!model.is_fitted());
        assert_eq!(model.predict_row(&[1.0, 2.0]), 0.0);
    }
}
