//! Photometric Stereo
//!
//! Recovers albedo, normals and depth from images of a static scene lit from
//! known directions.
//!
//! # Algorithms
//!
//! - **Domain builder**: Neumann neighbour links over a binary mask
//! - **3-D vector RANSAC**: robust fit of `I = s·m` under outliers
//! - **Sphere diffusion**: harmonic smoothing and Tichonov regularisation of
//!   unit-vector fields through the exponential map
//! - **Integration**: Simchony DCT solver and a direct sparse Poisson solver
//!
//! # Example: Integrating a Flat Field
//!
//! ```rust
//! use ps_core::{Mask, NormalField};
//! use ps_photo::integrate::simchony_integrate;
//!
//! let mask = Mask::full((8, 8));
//! let normals = NormalField::flat((8, 8));
//! let z = simchony_integrate(&normals, &mask).unwrap();
//! assert!(z.iter().all(|v| v.abs() < 1e-12));
//! ```

pub use ps_core::{Error, Result};

/// Neighbour links for Neumann-type stencils over a mask
pub mod domain;
/// Poisson integration of normal fields into depth maps
pub mod integrate;
/// Robust estimation of a 3-D vector from intensity observations
pub mod light_vector;
/// Diffusion and regularisation of unit-normal fields
pub mod smoothing;
/// Tangent projection and exponential map on the unit sphere
pub mod sphere;
/// Per-pixel albedo and normal estimation
pub mod stereo;

pub use domain::BoundaryData;
pub use integrate::{simchony_integrate, unbiased_integrate, IntegrationOrder, Integrator};
pub use light_vector::{ransac_3dvector, ransac_3dvector_with_rng, RansacConfig, VectorEstimate};
pub use smoothing::{
    smooth_normal_field, tichonov_regularisation, SmoothingConfig, TichonovConfig,
};
pub use sphere::{exp_map, project_orthogonal, sphere_exp_map, tangent_projection};
pub use stereo::{ransac_photometric_stereo, woodham_photometric_stereo, PhotometricEstimate};
