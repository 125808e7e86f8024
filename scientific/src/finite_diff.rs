//! Central differences with replicated borders.
//!
//! The missing neighbour at either end of an axis is the sample itself, so the
//! first and last lines get a one-sided difference still scaled by one half.

use ndarray::Array2;

/// `0.5 * (f[i+1, j] - f[i-1, j])` along axis 0, indices clamped to the grid.
pub fn cdx(f: &Array2<f64>) -> Array2<f64> {
    let (m, _) = f.dim();
    Array2::from_shape_fn(f.dim(), |(i, j)| {
        let east = (i + 1).min(m - 1);
        let west = i.saturating_sub(1);
        0.5 * (f[[east, j]] - f[[west, j]])
    })
}

/// `0.5 * (f[i, j+1] - f[i, j-1])` along axis 1, indices clamped to the grid.
pub fn cdy(f: &Array2<f64>) -> Array2<f64> {
    let (_, n) = f.dim();
    Array2::from_shape_fn(f.dim(), |(i, j)| {
        let north = (j + 1).min(n - 1);
        let south = j.saturating_sub(1);
        0.5 * (f[[i, north]] - f[[i, south]])
    })
}
