//! Diffusion of unit-normal fields on the sphere.
//!
//! Both flows move every in-domain normal along the sphere with
//! `N <- Exp_N(tau * P_N(direction))`, where `P_N` projects onto the tangent
//! plane at `N`. The direction is the discrete vector Laplacian over the
//! Neumann neighbour links (harmonic smoothing), plus a pull back toward the
//! input field for the Tichonov variant.

use crate::domain::BoundaryData;
use crate::sphere::{exp_map, tangent_projection};
use nalgebra::Vector3;
use ps_core::{Error, Mask, NormalField, Result};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Parameters of [`smooth_normal_field`].
#[derive(Debug, Clone)]
pub struct SmoothingConfig {
    pub iters: usize,
    /// Descent step size.
    pub tau: f64,
    /// Tangent vectors shorter than this are treated as zero length.
    pub epsilon: f64,
    pub verbose: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            iters: 100,
            tau: 0.05,
            epsilon: 1e-7,
            verbose: false,
        }
    }
}

/// Parameters of [`tichonov_regularisation`].
#[derive(Debug, Clone)]
pub struct TichonovConfig {
    /// Weight of the fidelity term `d(N, N0)^2` against smoothness.
    pub mu: f64,
    pub iters: usize,
    pub tau: f64,
    /// Guard for `arccos(x) / sqrt(1 - x^2)` as `x^2 -> 1`.
    pub epsilon: f64,
    pub verbose: bool,
}

impl TichonovConfig {
    pub fn new(mu: f64) -> Self {
        Self {
            mu,
            iters: 10,
            tau: 0.05,
            epsilon: 1e-7,
            verbose: false,
        }
    }
}

fn check_step(tau: f64) -> Result<()> {
    if !tau.is_finite() || tau < 0.0 {
        return Err(Error::InvalidInput(format!(
            "step size must be finite and non-negative, got {}",
            tau
        )));
    }
    Ok(())
}

fn resolve_boundary<'a>(
    mask: &Mask,
    bc: Option<&'a BoundaryData>,
    owned: &'a mut Option<BoundaryData>,
) -> Result<&'a BoundaryData> {
    match bc {
        Some(bc) => {
            bc.check_mask(mask)?;
            Ok(bc)
        }
        None => Ok(&*owned.insert(BoundaryData::from_mask(mask))),
    }
}

/// `sum over links of (N[link] - N[i])`; zero wherever the field is locally constant.
fn tension(n: &[Vector3<f64>], bc: &BoundaryData) -> Vec<Vector3<f64>> {
    (0..n.len())
        .into_par_iter()
        .map(|i| {
            let c = n[i];
            bc.links(i)
                .iter()
                .fold(Vector3::zeros(), |acc, &j| acc + (n[j] - c))
        })
        .collect()
}

/// Harmonic-map flow `dN/dt = tension(N)` restricted to the sphere.
///
/// Pixels outside the mask are returned as `(0, 0, 1)`. `bc` may be passed to
/// reuse adjacency built for the same mask; it is built otherwise.
pub fn smooth_normal_field(
    normals: &NormalField,
    mask: &Mask,
    bc: Option<&BoundaryData>,
    config: &SmoothingConfig,
) -> Result<NormalField> {
    mask.check_shape(normals.shape(), "normal field")?;
    check_step(config.tau)?;
    let mut owned = None;
    let bc = resolve_boundary(mask, bc, &mut owned)?;

    let mut n = normals.gather(&bc.inside);
    for iter in 0..config.iters {
        if config.verbose {
            trace!(iter, iters = config.iters, "smoothing iteration");
        }
        let v3 = tension(&n, bc);
        n = n
            .par_iter()
            .zip(v3.par_iter())
            .map(|(ni, vi)| exp_map(&(tangent_projection(vi, ni) * config.tau), ni, config.epsilon))
            .collect();
    }

    debug!(pixels = bc.n_pixels(), iters = config.iters, "smoothed normal field");
    Ok(NormalField::scatter(mask.shape(), &bc.inside, &n))
}

/// Gradient of `d(N, N0)^2 / 2` toward `N0`, scaled as `arccos(c) / sqrt(1 - c^2)`
/// with `c = N·N0`. Zero once `c^2 >= 1 - eps`.
fn fidelity_pull(n: &Vector3<f64>, n0: &Vector3<f64>, eps: f64) -> Vector3<f64> {
    let c = n.dot(n0);
    let c2 = (c * c).min(1.0);
    if c2 >= 1.0 - eps {
        return Vector3::zeros();
    }
    n0 * (c.acos() / (1.0 - c2).sqrt())
}

/// Sphere-valued Tichonov regularisation of `normals`:
/// `dN/dt = tension(N) - mu * grad d(N, N0)^2`, with `d` the arc distance.
///
/// Outside-mask pixels are returned as `(0, 0, 1)`.
pub fn tichonov_regularisation(
    normals: &NormalField,
    mask: &Mask,
    bc: Option<&BoundaryData>,
    config: &TichonovConfig,
) -> Result<NormalField> {
    mask.check_shape(normals.shape(), "normal field")?;
    check_step(config.tau)?;
    let mut owned = None;
    let bc = resolve_boundary(mask, bc, &mut owned)?;

    let n0 = normals.gather(&bc.inside);
    let mut n = n0.clone();
    for iter in 0..config.iters {
        if config.verbose {
            trace!(iter, iters = config.iters, "Tichonov iteration");
        }
        let v3 = tension(&n, bc);
        n = n
            .par_iter()
            .zip(v3.par_iter())
            .zip(n0.par_iter())
            .map(|((ni, vi), n0i)| {
                let d3 = fidelity_pull(ni, n0i, config.epsilon);
                let grad = tangent_projection(&(d3 * config.mu + vi), ni);
                exp_map(&(grad * config.tau), ni, config.epsilon)
            })
            .collect();
    }

    debug!(
        pixels = bc.n_pixels(),
        iters = config.iters,
        mu = config.mu,
        "regularised normal field"
    );
    Ok(NormalField::scatter(mask.shape(), &bc.inside, &n))
}
