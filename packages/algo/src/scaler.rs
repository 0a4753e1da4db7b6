//! Standard scaler: per-column zero mean, unit variance.

use serde::{Deserialize, Serialize};

/// Fitted column statistics. Columns with zero variance keep scale 1 so they
/// pass through centered but unscaled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };
        let d = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; d];
        for row in rows {
            for (m, &v) in mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut var = vec![0.0; d];
        for row in rows {
            for j in 0..d {
                let diff = row[j] - mean[j];
                var[j] += diff * diff;
            }
        }

        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn is_fitted(&self) -> bool {
        !self.mean.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Transform one row; an unfitted scaler is the identity.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        if !self.is_fitted() {
            return row.to_vec();
        }
        row.iter()
            .enumerate()
            .map(|(j, &v)| {
                let mean = self.mean.get(j).copied().unwrap_or(0.0);
                let scale = self.scale.get(j).copied().unwrap_or(1.0);
                (v - mean) / scale
            })
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let scaler = StandardScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        for j in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| r[j] * r[j]).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let rows = vec![vec![5.0], vec![5.0]];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.scale, vec![1.0]);
        assert_eq!(scaler.transform_row(&[7.0]), vec![2.0]);
    }

    #[test]
    fn test_unfitted_scaler_is_identity() {
        let scaler = StandardScaler::default();
        assert!(!scaler.is_fitted());
        assert_eq!(scaler.transform_row(&[1.5, -2.0]), vec![1.5, -2.0]);
    }
}
