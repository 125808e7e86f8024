//! Orthonormal 2-D discrete cosine transform (type II forward, type III
//! inverse), the `norm="ortho"` convention.
//!
//! The transform is separable: each axis is processed lane by lane, lanes in
//! parallel. With orthonormal scaling the basis vectors are the eigenvectors
//! of the reflecting (Neumann) discrete Laplacian, which is what the
//! transform-domain Poisson solver relies on.

use ndarray::{Array2, Axis, Zip};
use rustdct::DctPlanner;

/// Forward orthonormal DCT-II over both axes.
pub fn dct2_ortho(f: &Array2<f64>) -> Array2<f64> {
    let mut out = f.clone();
    for axis in [Axis(1), Axis(0)] {
        dct_axis(&mut out, axis);
    }
    out
}

/// Inverse of [`dct2_ortho`] (orthonormal DCT-III over both axes).
pub fn idct2_ortho(coeffs: &Array2<f64>) -> Array2<f64> {
    let mut out = coeffs.clone();
    for axis in [Axis(0), Axis(1)] {
        idct_axis(&mut out, axis);
    }
    out
}

fn dct_axis(a: &mut Array2<f64>, axis: Axis) {
    let len = a.len_of(axis);
    if len == 0 {
        return;
    }
    let plan = DctPlanner::<f64>::new().plan_dct2(len);
    let scale = (2.0 / len as f64).sqrt();
    let dc_scale = scale * std::f64::consts::FRAC_1_SQRT_2;

    Zip::from(a.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut buffer: Vec<f64> = lane.to_vec();
        plan.process_dct2(&mut buffer);
        for (k, (dst, v)) in lane.iter_mut().zip(buffer).enumerate() {
            *dst = if k == 0 { v * dc_scale } else { v * scale };
        }
    });
}

fn idct_axis(a: &mut Array2<f64>, axis: Axis) {
    let len = a.len_of(axis);
    if len == 0 {
        return;
    }
    let plan = DctPlanner::<f64>::new().plan_dct3(len);
    let scale = (2.0 / len as f64).sqrt();
    // the unscaled DCT-III halves its first input
    let dc_scale = scale * std::f64::consts::SQRT_2;

    Zip::from(a.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut buffer: Vec<f64> = lane
            .iter()
            .enumerate()
            .map(|(k, &v)| if k == 0 { v * dc_scale } else { v * scale })
            .collect();
        plan.process_dct3(&mut buffer);
        for (dst, v) in lane.iter_mut().zip(buffer) {
            *dst = v;
        }
    });
}
