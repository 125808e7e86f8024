//! Transform-domain Poisson integration.
//!
//! Reference: T. Simchony, R. Chellappa, M. Shao, "Direct analytical methods
//! for solving Poisson equations in computer vision problems", IEEE PAMI
//! 12(5), 1990.

use super::{depth_from_domain, surface_gradient};
use ndarray::Array2;
use ps_core::{DepthMap, Error, Mask, NormalField, Result};
use ps_scientific::{cdx, cdy, dct2_ortho, idct2_ortho};
use std::f64::consts::PI;
use tracing::debug;

/// Integrate `normals` over the whole rectangle with a DCT Poisson solve.
///
/// The mask only zeroes the gradient outside the domain; the solve itself
/// covers every grid sample. The mean height is fixed by dropping the DC
/// coefficient, and samples outside the mask are returned as NaN.
///
/// # Errors
/// - [`Error::DimensionMismatch`] if the mask and normals differ in shape
/// - [`Error::InvalidInput`] for grids with fewer than 2 rows or columns
pub fn simchony_integrate(normals: &NormalField, mask: &Mask) -> Result<DepthMap> {
    mask.check_shape(normals.shape(), "normal field")?;
    let (m, n) = mask.shape();
    if m < 2 || n < 2 {
        return Err(Error::InvalidInput(format!(
            "transform integration needs at least a 2x2 grid, got {}x{}",
            m, n
        )));
    }
    if mask.is_empty() {
        return Ok(Array2::from_elem((m, n), f64::NAN));
    }

    let (mut p, mut q) = surface_gradient(normals);
    for ((pv, qv), &inside) in p.iter_mut().zip(q.iter_mut()).zip(mask.as_array()) {
        if !inside {
            *pv = 0.0;
            *qv = 0.0;
        }
    }

    let mut f = cdx(&p) + cdy(&q);
    apply_boundary_divergence(&mut f, &p, &q);

    let fs = dct2_ortho(&f);
    let zs = Array2::from_shape_fn((m, n), |(x, y)| {
        if x == 0 && y == 0 {
            return 0.0;
        }
        let eigen = (2.0 * (PI * x as f64 / m as f64).cos() - 2.0)
            + (2.0 * (PI * y as f64 / n as f64).cos() - 2.0);
        fs[[x, y]] / eigen
    });
    let z = idct2_ortho(&zs);

    debug!(rows = m, cols = n, pixels = mask.count(), "transform integration");
    let inside: Vec<(usize, usize)> = mask.inside().collect();
    let values: Vec<f64> = inside.iter().map(|&(x, y)| z[[x, y]]).collect();
    Ok(depth_from_domain((m, n), &inside, values))
}

/// Overwrite the frame of `f` with the half-sum divergence that the reflecting
/// boundary implies. Requires at least 2 rows and 2 columns.
fn apply_boundary_divergence(f: &mut Array2<f64>, p: &Array2<f64>, q: &Array2<f64>) {
    let (m, n) = f.dim();
    let (xl, yl) = (m - 1, n - 1);

    for y in 1..yl {
        f[[0, y]] = 0.5 * (p[[0, y]] + p[[1, y]]);
        f[[xl, y]] = 0.5 * (-p[[xl, y]] - p[[xl - 1, y]]);
    }
    for x in 1..xl {
        f[[x, 0]] = 0.5 * (q[[x, 0]] + q[[x, 1]]);
        f[[x, yl]] = 0.5 * (-q[[x, yl]] - q[[x, yl - 1]]);
    }

    f[[0, 0]] = 0.5 * (p[[0, 0]] + p[[1, 0]] + q[[0, 0]] + q[[0, 1]]);
    f[[xl, 0]] = 0.5 * (-p[[xl, 0]] - p[[xl - 1, 0]] + q[[xl, 0]] + q[[xl, 1]]);
    f[[0, yl]] = 0.5 * (p[[0, yl]] + p[[1, yl]] - q[[0, yl]] - q[[1, yl]]);
    f[[xl, yl]] = 0.5 * (-p[[xl, yl]] - p[[xl - 1, yl]] - q[[xl, yl]] - q[[xl, yl - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn rejects_single_row() {
        let mask = Mask::full((1, 5));
        let err = simchony_integrate(&NormalField::flat((1, 5)), &mask);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn rejects_mismatched_mask() {
        let mask = Mask::full((4, 4));
        let err = simchony_integrate(&NormalField::flat((4, 5)), &mask);
        assert!(matches!(err, Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn empty_mask_is_all_nan() {
        let mask = Mask::new(Array2::from_elem((3, 3), false));
        let z = simchony_integrate(&NormalField::flat((3, 3)), &mask).unwrap();
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn outside_mask_is_nan_and_inside_finite() {
        let mask = Mask::from_fn((5, 6), |(x, y)| x > 0 && y < 5);
        let normals = NormalField::from_fn((5, 6), |(x, _)| {
            Vector3::new(0.0, -0.1 * x as f64, 1.0).normalize()
        });
        let z = simchony_integrate(&normals, &mask).unwrap();
        for ((x, y), v) in z.indexed_iter() {
            assert_eq!(v.is_nan(), !(x > 0 && y < 5));
        }
    }

    #[test]
    fn boundary_frame_uses_half_sums() {
        let p = Array2::from_shape_fn((3, 3), |(x, y)| (x * 3 + y) as f64);
        let q = Array2::from_shape_fn((3, 3), |(x, y)| 10.0 * (x * 3 + y) as f64);
        let mut f = Array2::zeros((3, 3));
        apply_boundary_divergence(&mut f, &p, &q);
        // top edge, interior column
        assert_eq!(f[[0, 1]], 0.5 * (1.0 + 4.0));
        // right edge, interior row
        assert_eq!(f[[1, 2]], 0.5 * (-50.0 - 40.0));
        // top-right corner pairs q[0, n-1] with q[1, n-1]
        assert_eq!(f[[0, 2]], 0.5 * (2.0 + 5.0 - 20.0 - 50.0));
        // centre untouched
        assert_eq!(f[[1, 1]], 0.0);
    }
}
