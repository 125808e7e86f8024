use crate::{Error, Result};
use faer::prelude::Solve;
use faer::sparse::SparseColMat;
use faer::Mat;
use nalgebra::DVector;
use tracing::debug;

pub use faer::sparse::Triplet;

/// Sparse matrix in coordinate form, backed by Faer for solving.
///
/// Duplicate `(row, col)` entries are summed on conversion.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    pub rows: usize,
    pub cols: usize,
    pub triplets: Vec<Triplet<usize, usize, f64>>,
}

impl SparseMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            triplets: Vec::new(),
        }
    }

    pub fn with_capacity(rows: usize, cols: usize, nnz: usize) -> Self {
        Self {
            rows,
            cols,
            triplets: Vec::with_capacity(nnz),
        }
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.triplets.push(Triplet::new(row, col, value));
    }

    /// Stored entries, duplicates included.
    pub fn nnz(&self) -> usize {
        self.triplets.len()
    }

    /// Compressed-column copy for factorisation.
    pub fn to_faer(&self) -> Result<SparseColMat<usize, f64>> {
        SparseColMat::try_new_from_triplets(self.rows, self.cols, &self.triplets).map_err(|e| {
            Error::InvalidInput(format!("Failed to create sparse matrix: {:?}", e))
        })
    }
}

/// Exact solver for `A x = b`.
pub trait LinearSolver {
    fn solve(&self, a: &SparseMatrix, b: &DVector<f64>) -> Result<DVector<f64>>;
}

/// Direct solve through a sparse LU factorisation.
///
/// A failed factorisation or a non-finite solution is reported as
/// [`Error::SingularSystem`] rather than returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseLuSolver;

impl LinearSolver for SparseLuSolver {
    fn solve(&self, a: &SparseMatrix, b: &DVector<f64>) -> Result<DVector<f64>> {
        if a.rows != a.cols {
            return Err(Error::DimensionMismatch(format!(
                "System matrix must be square, got {}x{}",
                a.rows, a.cols
            )));
        }
        if b.len() != a.rows {
            return Err(Error::DimensionMismatch(format!(
                "Right-hand side has {} entries, system has {} rows",
                b.len(),
                a.rows
            )));
        }
        if a.rows == 0 {
            return Ok(DVector::zeros(0));
        }

        let mat = a.to_faer()?;
        let lu = mat
            .as_ref()
            .sp_lu()
            .map_err(|e| Error::SingularSystem(format!("sparse LU failed: {:?}", e)))?;

        let rhs = Mat::from_fn(b.len(), 1, |i, _| b[i]);
        let sol = lu.solve(rhs.as_ref());
        let x = DVector::from_iterator(sol.nrows(), (0..sol.nrows()).map(|i| *sol.get(i, 0)));
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularSystem(
                "sparse LU produced a non-finite solution".into(),
            ));
        }

        debug!(n = a.rows, nnz = a.nnz(), "solved sparse system");
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_system() {
        let mut mat = SparseMatrix::new(3, 3);
        mat.add(0, 0, 2.0);
        mat.add(1, 1, 4.0);
        mat.add(2, 2, 0.5);

        let b = DVector::from_vec(vec![2.0, 4.0, 1.0]);
        let x = SparseLuSolver.solve(&mat, &b).unwrap();
        assert!((x - DVector::from_vec(vec![1.0, 1.0, 2.0])).amax() < 1e-12);
    }

    #[test]
    fn duplicate_entries_are_summed() {
        let mut mat = SparseMatrix::new(2, 2);
        mat.add(0, 0, 1.0);
        mat.add(0, 0, 1.0);
        mat.add(1, 1, 4.0);
        mat.add(0, 1, 1.0);

        // [[2, 1], [0, 4]] x = [4, 8] -> x = [1, 2]
        let b = DVector::from_vec(vec![4.0, 8.0]);
        let x = SparseLuSolver.solve(&mat, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_rhs() {
        let mut mat = SparseMatrix::new(2, 2);
        mat.add(0, 0, 1.0);
        mat.add(1, 1, 1.0);
        let b = DVector::from_vec(vec![1.0]);
        assert!(matches!(
            SparseLuSolver.solve(&mat, &b),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn singular_system_is_surfaced() {
        // second column is structurally empty
        let mut mat = SparseMatrix::new(2, 2);
        mat.add(0, 0, 1.0);
        mat.add(1, 0, 1.0);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            SparseLuSolver.solve(&mat, &b),
            Err(Error::SingularSystem(_))
        ));
    }

    #[test]
    fn empty_system_has_empty_solution() {
        let mat = SparseMatrix::new(0, 0);
        let x = SparseLuSolver.solve(&mat, &DVector::zeros(0)).unwrap();
        assert_eq!(x.len(), 0);
    }
}
