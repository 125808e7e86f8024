//! Shared foundations for the photometric-stereo workspace.
//!
//! - [`grid`]: the pixel-grid data model (mask, normal field, depth map)
//! - [`dataset`]: an image stack with its mask and light directions
//! - [`robust`]: an adaptive RANSAC engine over any [`RobustModel`]
//! - [`runtime`]: the global Rayon thread pool used by batch routines

pub mod dataset;
pub mod grid;
pub mod robust;
pub mod runtime;

pub use dataset::*;
pub use grid::*;
pub use robust::*;
pub use runtime::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("No well-conditioned sample found after {tries} tries, degenerate model?")]
    DegenerateSample { tries: usize },

    #[error("No model with a non-empty consensus set after {trials} trials")]
    NoModelFound { trials: usize },

    #[error("Singular system: {0}")]
    SingularSystem(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
