//! Sparse linear algebra used by the direct Poisson integrator.
//!
//! Systems are assembled in coordinate (triplet) form, converted to
//! compressed-column storage and solved exactly with a sparse LU
//! factorisation from `faer`.

pub mod sparse;

pub use ps_core::{Error, Result};
pub use sparse::{LinearSolver, SparseLuSolver, SparseMatrix};
