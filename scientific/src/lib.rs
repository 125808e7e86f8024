//! Scientific Computing (scipy equivalents)
//!
//! Dense-grid numerics shared by the integrators:
//! - [`finite_diff`]: central differences with replicated borders
//! - [`dct`]: orthonormal 2-D discrete cosine transform pair
//!
//! ## Example: Cosine Transform Round Trip
//!
//! ```rust
//! use ndarray::array;
//! use ps_scientific::dct::{dct2_ortho, idct2_ortho};
//!
//! let f = array![[1.0, 2.0], [3.0, 4.0]];
//! let back = idct2_ortho(&dct2_ortho(&f));
//! assert!((back[[1, 0]] - 3.0).abs() < 1e-12);
//! ```

pub mod dct;
pub mod finite_diff;

pub use ps_core::{Error, Result};

pub use dct::*;
pub use finite_diff::*;

use ndarray::Array2;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sum: f64 = data.iter().sum();
    Some(sum / data.len() as f64)
}

/// Mean over the finite samples of a grid, ignoring NaN padding.
pub fn nan_mean(a: &Array2<f64>) -> Option<f64> {
    let finite: Vec<f64> = a.iter().copied().filter(|v| v.is_finite()).collect();
    mean(&finite)
}

/// Subtract the finite mean from every sample; NaN samples stay NaN.
pub fn mean_centered(a: &Array2<f64>) -> Array2<f64> {
    match nan_mean(a) {
        Some(m) => a.mapv(|v| v - m),
        None => a.clone(),
    }
}
