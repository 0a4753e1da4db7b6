//! # engage-algo - numeric primitives for learner-engagement models
//!
//! Pure Rust implementations of the small set of estimators the adaptive
//! learning service trains at startup:
//!
//! - **StandardScaler** - per-feature zero-mean, unit-variance scaling
//! - **LinearRegression** - ordinary least squares via Cholesky
//! - **DecisionTree** - CART classifier and regressor
//! - **RandomForest** - bagged CART ensemble, grown in parallel
//! - **IsolationForest** - unsupervised outlier scoring
//!
//! Every fitter takes an explicit seed so repeated fits on the same data
//! produce identical models.
//!
//! ## Modules
//!
//! - [`scaler`] - feature standardisation
//! - [`linear`] - least squares regression
//! - [`tree`] - CART trees
//! - [`forest`] - random forests
//! - [`isolation`] - isolation forests
//! - [`matrix`] - Cholesky solve for the normal equations
//! - [`sanitize`] - numerical stability and output rounding
//! - [`types`] - shared constants and parameter types
//!
//! ## Example
//!
//! ```rust
//! use engage_algo::{IsolationForest, IsolationParams, StandardScaler};
//!
//! let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, (i % 5) as f64]).collect();
//! let scaler = StandardScaler::fit(&rows);
//! let scaled = scaler.transform(&rows);
//! let forest = IsolationForest::fit(&scaled, &IsolationParams::default());
//! assert!(forest.is_fitted());
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod forest;
pub mod isolation;
pub mod linear;
pub mod matrix;
pub mod sanitize;
pub mod scaler;
pub mod tree;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use forest::{ForestParams, ForestTask, RandomForest};
pub use isolation::{IsolationForest, IsolationParams};
pub use linear::LinearRegression;
pub use sanitize::{clamp_unit, round_to};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeNode};
