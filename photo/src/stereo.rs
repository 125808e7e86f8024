//! Per-pixel albedo and normal estimation from a [`PhotometricDataset`].
//!
//! Each in-mask pixel yields `m = albedo * normal` from its `K` intensities;
//! `albedo = |m|` and `normal = m / |m|`.

use crate::light_vector::{ransac_3dvector_with_rng, RansacConfig};
use nalgebra::{DMatrix, DVector, Vector3};
use ndarray::Array2;
use ps_core::{Error, NormalField, PhotometricDataset, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

/// Albedo and normals recovered over the mask.
#[derive(Debug, Clone)]
pub struct PhotometricEstimate {
    /// NaN outside the mask and at failed pixels.
    pub albedo: Array2<f64>,
    /// `(0, 0, 1)` outside the mask, at failed pixels and where `m = 0`.
    pub normals: NormalField,
    /// Pixels for which no estimate could be made.
    pub failed: usize,
}

impl PhotometricEstimate {
    fn assemble(shape: (usize, usize), coords: &[(usize, usize)], m: &[Option<Vector3<f64>>]) -> Self {
        let mut albedo = Array2::from_elem(shape, f64::NAN);
        let mut normals = NormalField::flat(shape);
        let mut failed = 0;
        for (&(x, y), v) in coords.iter().zip(m) {
            match v {
                Some(v) => {
                    let rho = v.norm();
                    albedo[[x, y]] = rho;
                    if rho > 0.0 {
                        normals.set(x, y, v / rho);
                    }
                }
                None => failed += 1,
            }
        }
        Self {
            albedo,
            normals,
            failed,
        }
    }
}

/// Least-squares estimate `m = pinv(S) I` at every pixel.
pub fn woodham_photometric_stereo(dataset: &PhotometricDataset) -> Result<PhotometricEstimate> {
    let s = dataset.lights();
    let pinv = pseudo_inverse(s)?;
    let coords: Vec<(usize, usize)> = dataset.mask().inside().collect();

    let m: Vec<Option<Vector3<f64>>> = coords
        .par_iter()
        .map(|&(x, y)| {
            let i = DVector::from_vec(dataset.intensities(x, y));
            let v = &pinv * i;
            let v = Vector3::new(v[0], v[1], v[2]);
            v.iter().all(|c| c.is_finite()).then_some(v)
        })
        .collect();

    let estimate = PhotometricEstimate::assemble(dataset.shape(), &coords, &m);
    debug!(
        pixels = coords.len(),
        failed = estimate.failed,
        "least-squares photometric stereo"
    );
    Ok(estimate)
}

/// Robust estimate of `m` at every pixel with [`crate::ransac_3dvector`].
///
/// Pixel `(x, y)` draws from a `StdRng` seeded with `seed + x * n + y`, so the
/// result does not depend on scheduling. Pixels where the estimator fails are
/// counted in [`PhotometricEstimate::failed`] rather than aborting the batch.
pub fn ransac_photometric_stereo(
    dataset: &PhotometricDataset,
    config: &RansacConfig,
    seed: u64,
) -> Result<PhotometricEstimate> {
    let (_, n) = dataset.shape();
    let coords: Vec<(usize, usize)> = dataset.mask().inside().collect();

    let outcomes: Vec<Result<Vector3<f64>>> = coords
        .par_iter()
        .map(|&(x, y)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add((x * n + y) as u64));
            ransac_3dvector_with_rng(&dataset.intensities(x, y), dataset.lights(), config, &mut rng)
                .map(|est| est.vector)
        })
        .collect();

    let mut m = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(v) => m.push(Some(v)),
            Err(Error::DegenerateSample { .. }) | Err(Error::NoModelFound { .. }) => m.push(None),
            Err(e) => return Err(e),
        }
    }

    let estimate = PhotometricEstimate::assemble(dataset.shape(), &coords, &m);
    debug!(
        pixels = coords.len(),
        failed = estimate.failed,
        seed,
        "robust photometric stereo"
    );
    Ok(estimate)
}

fn pseudo_inverse(s: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let svd = s.clone().svd(true, true);
    let cutoff = 1e-15 * svd.singular_values.max();
    svd.pseudo_inverse(cutoff)
        .map_err(|e| Error::SingularSystem(format!("light matrix pseudo-inverse: {}", e)))
}
