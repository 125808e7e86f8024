//! Robust Estimation Module
//!
//! Provides an adaptive RANSAC engine (Fischler & Bolles) that can be used for
//! any model with a minimal-sample solver and a least-squares refit.
//!
//! The required number of trials is re-estimated every time the consensus set
//! grows, from the current inlier ratio and the requested confidence.

use crate::{Error, Result};
use rand::Rng;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Configuration for robust estimation
#[derive(Debug, Clone)]
pub struct RobustConfig {
    /// A datum is an inlier when its error is `<= threshold`.
    pub threshold: f64,
    /// Hard cap on trials; at most `max_iterations + 1` models are explored.
    pub max_iterations: usize,
    /// Probability of drawing at least one outlier-free sample.
    pub confidence: f64,
    /// Attempts at drawing a valid sample before giving up on the data.
    pub max_sample_tries: usize,
    /// 0 = silent, 1 = summary events, >= 2 = per-trial events.
    pub verbosity: u8,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            threshold: 1e-2,
            max_iterations: 1000,
            confidence: 0.9,
            max_sample_tries: 100,
            verbosity: 0,
        }
    }
}

/// Result of robust estimation
#[derive(Debug, Clone)]
pub struct RobustResult<M> {
    pub model: M,
    /// Indices of the inliers of the best minimal model, ascending.
    pub inliers: Vec<usize>,
    /// Mean error of the refitted model over `inliers`.
    pub residual: f64,
    /// Number of trials actually run.
    pub trials: usize,
}

/// Trait for models that can be estimated robustly
pub trait RobustModel<D> {
    type Model: Clone;

    /// Minimum number of data points required to estimate the model
    fn min_sample_size(&self) -> usize;

    /// Reject samples that would give an ill-conditioned minimal fit.
    fn is_valid_sample(&self, _sample: &[&D]) -> bool {
        true
    }

    /// Estimate model from a minimal sample
    fn estimate(&self, sample: &[&D]) -> Option<Self::Model>;

    /// Least-squares refit over a consensus set. `None` keeps the minimal model.
    fn refine(&self, _inliers: &[&D]) -> Option<Self::Model> {
        None
    }

    /// Compute error for a single data point against the model
    fn compute_error(&self, model: &Self::Model, data: &D) -> f64;
}

/// Best model seen so far, threaded through the trial loop.
#[derive(Debug, Clone)]
struct Consensus<M> {
    model: M,
    inliers: Vec<usize>,
    fit: f64,
}

/// Generic RANSAC engine
pub struct Ransac<D, M: RobustModel<D>> {
    config: RobustConfig,
    _phantom: PhantomData<(D, M)>,
}

impl<D, M: RobustModel<D>> Ransac<D, M> {
    pub fn new(config: RobustConfig) -> Self {
        Self {
            config,
            _phantom: PhantomData,
        }
    }

    pub fn config(&self) -> &RobustConfig {
        &self.config
    }

    /// Run with the thread-local generator.
    pub fn run(&self, estimator: &M, data: &[D]) -> Result<RobustResult<M::Model>> {
        self.run_with_rng(estimator, data, &mut rand::thread_rng())
    }

    /// Run with an injected generator, the only source of nondeterminism.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        estimator: &M,
        data: &[D],
        rng: &mut R,
    ) -> Result<RobustResult<M::Model>> {
        let n = data.len();
        let k = estimator.min_sample_size();
        if n < k {
            return Err(Error::InvalidInput(format!(
                "RANSAC needs at least {} data points, got {}",
                k, n
            )));
        }

        let verbosity = self.config.verbosity;
        let mut best: Option<Consensus<M::Model>> = None;
        let mut trials = 0usize;
        let mut required = 1.0f64;

        while required > trials as f64 {
            if verbosity >= 2 {
                trace!(trial = trials, "ransac trial");
            }

            let sample = self.draw_sample(estimator, data, rng)?;

            if let Some(model) = estimator.estimate(&sample) {
                let inliers: Vec<usize> = data
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| estimator.compute_error(&model, d) <= self.config.threshold)
                    .map(|(j, _)| j)
                    .collect();
                let best_score = best.as_ref().map_or(0, |b| b.inliers.len());

                if verbosity >= 2 {
                    trace!(trial = trials, inliers = inliers.len(), "scored candidate");
                }

                if inliers.len() > best_score {
                    let members: Vec<&D> = inliers.iter().map(|&j| &data[j]).collect();
                    let refined = estimator.refine(&members).unwrap_or(model);
                    let fit = members
                        .iter()
                        .map(|d| estimator.compute_error(&refined, d))
                        .sum::<f64>()
                        / members.len() as f64;

                    required = required_trials(
                        inliers.len() as f64 / n as f64,
                        k,
                        self.config.confidence,
                    );
                    if verbosity >= 1 {
                        debug!(
                            trial = trials,
                            inliers = inliers.len(),
                            fit,
                            required,
                            "ransac model improved"
                        );
                    }
                    best = Some(Consensus {
                        model: refined,
                        inliers,
                        fit,
                    });
                }
            }

            trials += 1;
            if trials > self.config.max_iterations {
                if verbosity >= 1 {
                    debug!(trials, "ransac reached maximum number of trials");
                }
                break;
            }
        }

        match best {
            Some(c) => {
                if verbosity >= 2 {
                    trace!(trials, "ransac returning");
                }
                Ok(RobustResult {
                    model: c.model,
                    inliers: c.inliers,
                    residual: c.fit,
                    trials,
                })
            }
            None => {
                if verbosity >= 1 {
                    debug!(trials, "ransac found no acceptable model");
                }
                Err(Error::NoModelFound { trials })
            }
        }
    }

    fn draw_sample<'a, R: Rng + ?Sized>(
        &self,
        estimator: &M,
        data: &'a [D],
        rng: &mut R,
    ) -> Result<Vec<&'a D>> {
        let k = estimator.min_sample_size();
        for _ in 0..self.config.max_sample_tries {
            let sample: Vec<&D> = rand::seq::index::sample(rng, data.len(), k)
                .iter()
                .map(|i| &data[i])
                .collect();
            if estimator.is_valid_sample(&sample) {
                return Ok(sample);
            }
        }
        if self.config.verbosity >= 1 {
            debug!(
                tries = self.config.max_sample_tries,
                "no valid sample found, degenerate model?"
            );
        }
        Err(Error::DegenerateSample {
            tries: self.config.max_sample_tries,
        })
    }
}

/// Trials needed to draw one all-inlier sample of `sample_size` points with
/// probability `confidence`, given the current `inlier_ratio`.
///
/// The outlier-sample probability is clamped one ULP inside `(0, 1)` so the
/// logarithm stays finite.
pub fn required_trials(inlier_ratio: f64, sample_size: usize, confidence: f64) -> f64 {
    let p_outliers = 1.0 - inlier_ratio.powi(sample_size as i32);
    let eps = ulp(p_outliers);
    let p_outliers = p_outliers.max(eps).min(1.0 - eps);
    (1.0 - confidence).ln() / p_outliers.ln()
}

/// Distance from `|x|` to the next larger representable float.
pub fn ulp(x: f64) -> f64 {
    let x = x.abs();
    if !x.is_finite() {
        return f64::NAN;
    }
    f64::from_bits(x.to_bits() + 1) - x
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// y = a * x through pairs (x, y).
    struct Slope;

    impl RobustModel<(f64, f64)> for Slope {
        type Model = f64;

        fn min_sample_size(&self) -> usize {
            1
        }

        fn is_valid_sample(&self, sample: &[&(f64, f64)]) -> bool {
            sample[0].0.abs() > 1e-3
        }

        fn estimate(&self, sample: &[&(f64, f64)]) -> Option<f64> {
            Some(sample[0].1 / sample[0].0)
        }

        fn refine(&self, inliers: &[&(f64, f64)]) -> Option<f64> {
            let sxy: f64 = inliers.iter().map(|(x, y)| x * y).sum();
            let sxx: f64 = inliers.iter().map(|(x, _)| x * x).sum();
            (sxx > 0.0).then(|| sxy / sxx)
        }

        fn compute_error(&self, model: &f64, d: &(f64, f64)) -> f64 {
            (d.1 - model * d.0).abs()
        }
    }

    #[test]
    fn recovers_slope_with_outliers() {
        let mut data: Vec<(f64, f64)> = (1..=40).map(|i| (i as f64, 2.0 * i as f64)).collect();
        data.extend((1..=10).map(|i| (i as f64, -5.0 * i as f64 - 3.0)));

        let ransac = Ransac::new(RobustConfig {
            threshold: 1e-6,
            confidence: 0.99,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(7);
        let result = ransac.run_with_rng(&Slope, &data, &mut rng).unwrap();

        assert!((result.model - 2.0).abs() < 1e-12);
        assert_eq!(result.inliers, (0..40).collect::<Vec<_>>());
        assert!(result.residual < 1e-12);
    }

    #[test]
    fn degenerate_samples_are_reported() {
        let data = vec![(0.0, 1.0); 10];
        let ransac = Ransac::new(RobustConfig {
            max_sample_tries: 5,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        match ransac.run_with_rng(&Slope, &data, &mut rng) {
            Err(Error::DegenerateSample { tries }) => assert_eq!(tries, 5),
            other => panic!("expected degenerate sample error, got {:?}", other),
        }
    }

    #[test]
    fn empty_consensus_is_no_model() {
        let data = vec![(1.0, f64::NAN); 5];
        let ransac = Ransac::new(RobustConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            ransac.run_with_rng(&Slope, &data, &mut rng),
            Err(Error::NoModelFound { trials: 1 })
        ));
    }

    #[test]
    fn too_few_points_is_invalid_input() {
        let ransac = Ransac::new(RobustConfig::default());
        let data: Vec<(f64, f64)> = Vec::new();
        assert!(matches!(ransac.run(&Slope, &data), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn required_trials_matches_closed_form() {
        let k = required_trials(0.8, 3, 0.9);
        let expected = (0.1f64).ln() / (1.0 - 0.512f64).ln();
        assert!((k - expected).abs() < 1e-12);
    }

    #[test]
    fn required_trials_is_finite_at_extremes() {
        // every point an inlier
        let k = required_trials(1.0, 3, 0.9);
        assert!(k.is_finite() && k >= 0.0);
        // vanishing inlier ratio
        let k = required_trials(1e-9, 3, 0.9);
        assert!(k.is_finite() && k > 1e6);
    }

    #[test]
    fn ulp_of_one_is_machine_epsilon() {
        assert_eq!(ulp(1.0), f64::EPSILON);
        assert!(ulp(0.0) > 0.0);
    }
}
