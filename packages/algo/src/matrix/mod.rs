//! Small dense solver for the normal equations.
//!
//! Matrices are row-major flat buffers of size `d * d`.

use crate::types::{EPSILON, MIN_LAMBDA};

/// Lower Cholesky factor `L` with `A = L L^T`.
///
/// Pivots that come out non-positive are replaced by `sqrt(lambda)`, so a
/// rank-deficient Gram matrix still yields a usable factor.
pub fn cholesky_decompose(a: &[f64], d: usize, lambda: f64) -> Vec<f64> {
    let floor = lambda.max(MIN_LAMBDA);
    let mut l = vec![0.0; d * d];

    for i in 0..d {
        for j in 0..=i {
            let partial: f64 = (0..j).map(|k| l[i * d + k] * l[j * d + k]).sum();
            let mut value = a[i * d + j] - partial;

            l[i * d + j] = if i == j {
                value += floor * EPSILON;
                if value > 0.0 {
                    value.sqrt()
                } else {
                    floor.sqrt()
                }
            } else {
                safe_div(value, l[j * d + j])
            };
        }
    }
    l
}

/// Solves `A x = b` from the factor returned by [`cholesky_decompose`].
pub fn solve_cholesky(l: &[f64], b: &[f64], d: usize) -> Vec<f64> {
    let mut y = vec![0.0; d];
    for i in 0..d {
        let partial: f64 = (0..i).map(|j| l[i * d + j] * y[j]).sum();
        y[i] = safe_div(b[i] - partial, l[i * d + i]);
    }

    let mut x = vec![0.0; d];
    for i in (0..d).rev() {
        let partial: f64 = (i + 1..d).map(|j| l[j * d + i] * x[j]).sum();
        x[i] = safe_div(y[i] - partial, l[i * d + i]);
    }
    x
}

/// `a += x x^T`
pub fn rank1_update_matrix(a: &mut [f64], x: &[f64], d: usize) {
    for (i, xi) in x.iter().enumerate().take(d) {
        for (j, xj) in x.iter().enumerate().take(d) {
            a[i * d + j] += xi * xj;
        }
    }
}

/// `a += scale * b`
pub fn vec_add_scaled(a: &mut [f64], b: &[f64], scale: f64) {
    for (ai, bi) in a.iter_mut().zip(b) {
        *ai += scale * bi;
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den.abs() > EPSILON {
        num / den
    } else {
        0.0
    }
}
