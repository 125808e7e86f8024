//! Tangent projection and Riemannian exponential map on the unit sphere.
//!
//! Fields are slices of 3-vectors, one per in-domain pixel. The slice-level
//! functions are pointwise maps of the single-vector ones.

use nalgebra::Vector3;

/// Component of `p` orthogonal to the unit vector `n`: `p - (p·n) n`.
pub fn tangent_projection(p: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    p - n * p.dot(n)
}

/// `Exp_n(v) = n cos|v| + (v / |v|) sin|v|` for `v` tangent at `n`.
///
/// When `|v| < eps` the divisor is replaced by 1, so a zero vector maps to
/// `n` exactly.
pub fn exp_map(v: &Vector3<f64>, n: &Vector3<f64>, eps: f64) -> Vector3<f64> {
    let nv = v.norm();
    let (sv, cv) = nv.sin_cos();
    let denom = if nv < eps { 1.0 } else { nv };
    n * cv + (v / denom) * sv
}

/// Pointwise [`tangent_projection`].
pub fn project_orthogonal(p: &[Vector3<f64>], n: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    p.iter()
        .zip(n)
        .map(|(p, n)| tangent_projection(p, n))
        .collect()
}

/// Pointwise [`exp_map`].
pub fn sphere_exp_map(v: &[Vector3<f64>], n: &[Vector3<f64>], eps: f64) -> Vec<Vector3<f64>> {
    v.iter().zip(n).map(|(v, n)| exp_map(v, n, eps)).collect()
}
