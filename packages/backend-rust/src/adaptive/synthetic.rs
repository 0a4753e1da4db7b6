//! Sampling helpers for the seeded synthetic training sets.

use rand::Rng;

/// Exponential draw with the given mean, by inverse transform.
pub fn exponential<R: Rng + ?Sized>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.random();
    -(1.0 - u).ln() * scale
}

/// Standard normal draw scaled by `std_dev` (Box-Muller).
pub fn normal<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * std_dev
}
