//! RANSAC for a 3-D vector in the linear model `I = s·m`.
//!
//! `I` is an observed intensity, `s` a light direction (one row of the light
//! matrix) and `m = albedo · normal` the vector to recover. Minimal samples are
//! three observations whose directions span space well enough
//! (`|det| >= det_threshold`); the best consensus set is refitted by
//! pseudo-inverse.
//!
//! Reference: Fischler & Bolles, "Random Sample Consensus", Comm. ACM 24(6),
//! 1981.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use ps_core::{Error, Ransac, Result, RobustConfig, RobustModel};
use rand::Rng;

/// One `(I, s)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub intensity: f64,
    pub direction: Vector3<f64>,
}

/// Parameters of [`ransac_3dvector`].
#[derive(Debug, Clone)]
pub struct RansacConfig {
    /// `|I - s·m| <= threshold` marks an inlier.
    pub threshold: f64,
    /// Attempts at drawing a well-conditioned triple before giving up.
    pub max_data_tries: usize,
    /// Cap on explored models.
    pub max_iters: usize,
    /// Desired probability of drawing at least one outlier-free triple.
    pub p: f64,
    /// Minimum `|det|` of a sampled 3x3 direction matrix.
    pub det_threshold: f64,
    /// 0 = silent, 1 = some events, >= 2 = per-trial events.
    pub verbosity: u8,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            threshold: 1e-2,
            max_data_tries: 100,
            max_iters: 1000,
            p: 0.9,
            det_threshold: 1e-1,
            verbosity: 0,
        }
    }
}

impl RansacConfig {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.p > 0.0 && self.p < 1.0) {
            return Err(Error::InvalidInput(format!(
                "confidence p must lie in (0, 1), got {}",
                self.p
            )));
        }
        if self.max_data_tries == 0 {
            return Err(Error::InvalidInput("max_data_tries must be >= 1".into()));
        }
        Ok(())
    }

    fn robust_config(&self) -> RobustConfig {
        RobustConfig {
            threshold: self.threshold,
            max_iterations: self.max_iters,
            confidence: self.p,
            max_sample_tries: self.max_data_tries,
            verbosity: self.verbosity,
        }
    }
}

/// Output of a successful estimation.
#[derive(Debug, Clone)]
pub struct VectorEstimate {
    pub vector: Vector3<f64>,
    /// Observation indices in `[0, K)` consistent with the best model.
    pub inliers: Vec<usize>,
    /// Mean `|I - s·m|` over the inliers for the refitted vector.
    pub best_fit: f64,
}

/// Minimal solver and refit for `I = s·m`.
#[derive(Debug, Clone, Copy)]
pub struct LinearVectorModel {
    pub det_threshold: f64,
}

fn direction_matrix(sample: &[&Observation]) -> Matrix3<f64> {
    Matrix3::from_rows(&[
        sample[0].direction.transpose(),
        sample[1].direction.transpose(),
        sample[2].direction.transpose(),
    ])
}

impl RobustModel<Observation> for LinearVectorModel {
    type Model = Vector3<f64>;

    fn min_sample_size(&self) -> usize {
        3
    }

    fn is_valid_sample(&self, sample: &[&Observation]) -> bool {
        direction_matrix(sample).determinant().abs() >= self.det_threshold
    }

    fn estimate(&self, sample: &[&Observation]) -> Option<Vector3<f64>> {
        let s = direction_matrix(sample);
        let i = Vector3::new(sample[0].intensity, sample[1].intensity, sample[2].intensity);
        s.try_inverse().map(|inv| inv * i)
    }

    fn refine(&self, inliers: &[&Observation]) -> Option<Vector3<f64>> {
        let s = DMatrix::from_fn(inliers.len(), 3, |r, c| inliers[r].direction[c]);
        let i = DVector::from_iterator(inliers.len(), inliers.iter().map(|o| o.intensity));
        let svd = s.svd(true, true);
        // numpy's pinv cutoff, relative to the largest singular value
        let cutoff = 1e-15 * svd.singular_values.max();
        let pinv = svd.pseudo_inverse(cutoff).ok()?;
        let m = pinv * i;
        Some(Vector3::new(m[0], m[1], m[2]))
    }

    fn compute_error(&self, model: &Vector3<f64>, data: &Observation) -> f64 {
        (data.intensity - data.direction.dot(model)).abs()
    }
}

/// Pair up intensities with the rows of a `(K, 3)` light matrix.
pub fn observations(intensities: &[f64], lights: &DMatrix<f64>) -> Result<Vec<Observation>> {
    if lights.ncols() != 3 {
        return Err(Error::DimensionMismatch(format!(
            "light matrix must have 3 columns, got {}",
            lights.ncols()
        )));
    }
    if lights.nrows() != intensities.len() {
        return Err(Error::DimensionMismatch(format!(
            "{} intensities for {} light directions",
            intensities.len(),
            lights.nrows()
        )));
    }
    Ok(intensities
        .iter()
        .enumerate()
        .map(|(k, &intensity)| Observation {
            intensity,
            direction: Vector3::new(lights[(k, 0)], lights[(k, 1)], lights[(k, 2)]),
        })
        .collect())
}

/// Robustly estimate `m` from `I_k ≈ s_k·m`, using the thread-local generator.
pub fn ransac_3dvector(
    intensities: &[f64],
    lights: &DMatrix<f64>,
    config: &RansacConfig,
) -> Result<VectorEstimate> {
    ransac_3dvector_with_rng(intensities, lights, config, &mut rand::thread_rng())
}

/// [`ransac_3dvector`] with an injected random source.
///
/// # Errors
/// - [`Error::DegenerateSample`] when no triple with `|det| >= det_threshold`
///   is drawn within `max_data_tries` attempts
/// - [`Error::NoModelFound`] when no model ever gains an inlier
pub fn ransac_3dvector_with_rng<R: Rng + ?Sized>(
    intensities: &[f64],
    lights: &DMatrix<f64>,
    config: &RansacConfig,
    rng: &mut R,
) -> Result<VectorEstimate> {
    config.validate()?;
    let data = observations(intensities, lights)?;
    let estimator = LinearVectorModel {
        det_threshold: config.det_threshold,
    };
    let result = Ransac::new(config.robust_config()).run_with_rng(&estimator, &data, rng)?;
    Ok(VectorEstimate {
        vector: result.model,
        inliers: result.inliers,
        best_fit: result.residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lights() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0, //
                0.6, 0.0, 0.8,
            ],
        )
    }

    #[test]
    fn exact_data_is_all_inliers() {
        let m = Vector3::new(0.2, -0.4, 0.9);
        let s = lights();
        let i: Vec<f64> = (0..4)
            .map(|k| s[(k, 0)] * m.x + s[(k, 1)] * m.y + s[(k, 2)] * m.z)
            .collect();
        let mut rng = StdRng::seed_from_u64(11);
        let est =
            ransac_3dvector_with_rng(&i, &s, &RansacConfig::with_threshold(1e-9), &mut rng).unwrap();
        assert!((est.vector - m).norm() < 1e-12);
        assert_eq!(est.inliers, vec![0, 1, 2, 3]);
        assert!(est.best_fit < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = ransac_3dvector(&[1.0, 2.0], &lights(), &RansacConfig::default());
        assert!(matches!(err, Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let config = RansacConfig {
            p: 1.0,
            ..Default::default()
        };
        let err = ransac_3dvector(&[1.0; 4], &lights(), &config);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn minimal_fit_inverts_direction_matrix() {
        let model = LinearVectorModel { det_threshold: 0.1 };
        let obs = observations(&[1.0, 2.0, 3.0], &DMatrix::identity(3, 3)).unwrap();
        let refs: Vec<&Observation> = obs.iter().collect();
        assert!(model.is_valid_sample(&refs));
        assert_eq!(model.estimate(&refs), Some(Vector3::new(1.0, 2.0, 3.0)));
    }
}
