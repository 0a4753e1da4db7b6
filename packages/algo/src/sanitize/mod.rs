//! Numeric hygiene shared by the fitters.
//!
//! Training data comes from synthetic generators and live event windows, so
//! non-finite or extreme values are clipped rather than rejected.

use crate::types::{MAX_FEATURE_ABS, MAX_GRAM, MIN_LAMBDA};

/// Replaces NaN and infinities with 0 and clips into `±MAX_FEATURE_ABS`.
pub fn sanitize_feature_vector(x: &mut [f64]) {
    for v in x.iter_mut() {
        *v = if v.is_finite() {
            v.clamp(-MAX_FEATURE_ABS, MAX_FEATURE_ABS)
        } else {
            0.0
        };
    }
}

/// Repairs a Gram matrix in place and adds a ridge term to its diagonal.
///
/// Non-finite diagonal entries become `MIN_LAMBDA`, non-finite off-diagonal
/// entries become 0, magnitudes are capped at `MAX_GRAM`, and the result is
/// symmetrised by averaging mirrored entries.
pub fn sanitize_gram(a: &mut [f64], d: usize, lambda: f64) {
    let ridge = lambda.max(0.0);

    for i in 0..d {
        for j in 0..d {
            let cell = &mut a[i * d + j];
            if !cell.is_finite() {
                *cell = if i == j { MIN_LAMBDA } else { 0.0 };
            } else if cell.abs() > MAX_GRAM {
                *cell = cell.signum() * MAX_GRAM;
            }
        }
        a[i * d + i] += ridge;
    }

    for i in 0..d {
        for j in i + 1..d {
            let mean = 0.5 * (a[i * d + j] + a[j * d + i]);
            a[i * d + j] = mean;
            a[j * d + i] = mean;
        }
    }
}

/// Half-away-from-zero rounding to `decimals` places; non-finite input gives 0.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clips into [0, 1]; NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
