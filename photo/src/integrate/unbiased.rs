use super::{depth_from_domain, surface_gradient, IntegrationOrder};
use crate::domain::BoundaryData;
use nalgebra::DVector;
use ndarray::Array2;
use ps_core::{DepthMap, Mask, NormalField, Result};
use ps_optimize::{LinearSolver, SparseLuSolver, SparseMatrix};
use rayon::prelude::*;
use tracing::debug;

/// Diagonal shift that pins the additive constant of the Neumann system.
const REGULARISATION: f64 = 1e-9;

/// Integrate `normals` over the masked domain with a direct sparse solve.
///
/// Every ordered pair of 4-adjacent in-domain pixels contributes
/// `z_i - z_j = -(gradient along i -> j)`. Summed per pixel this gives the
/// graph-Laplacian system `A z = b`, shifted by `1e-9 I` and solved by sparse
/// LU. Only in-domain gradient samples are read.
///
/// # Errors
/// - [`ps_core::Error::DimensionMismatch`] if mask and normals differ in shape
/// - [`ps_core::Error::SingularSystem`] if the solve fails
pub fn unbiased_integrate(
    normals: &NormalField,
    mask: &Mask,
    order: IntegrationOrder,
) -> Result<DepthMap> {
    mask.check_shape(normals.shape(), "normal field")?;
    let bc = BoundaryData::from_mask(mask);
    if bc.is_empty() {
        return Ok(Array2::from_elem(mask.shape(), f64::NAN));
    }

    let (p, q) = surface_gradient(normals);
    let (pbar, qbar) = match order {
        IntegrationOrder::First => (p, q),
        IntegrationOrder::Second => (midpoint_rows(&p), midpoint_cols(&q)),
    };

    let (a, b) = assemble(&bc, &pbar, &qbar);
    debug!(
        pixels = bc.n_pixels(),
        nnz = a.nnz(),
        order = ?order,
        "assembled sparse integration system"
    );

    let z = SparseLuSolver.solve(&a, &b)?;
    Ok(depth_from_domain(mask.shape(), &bc.inside, z.iter().copied()))
}

/// `0.5 * (f[x, y] + f[x + 1, y])`, the last row paired with itself.
fn midpoint_rows(f: &Array2<f64>) -> Array2<f64> {
    let (m, _) = f.dim();
    Array2::from_shape_fn(f.dim(), |(x, y)| 0.5 * (f[[x, y]] + f[[(x + 1).min(m - 1), y]]))
}

/// `0.5 * (f[x, y] + f[x, y + 1])`, the last column paired with itself.
fn midpoint_cols(f: &Array2<f64>) -> Array2<f64> {
    let (_, n) = f.dim();
    Array2::from_shape_fn(f.dim(), |(x, y)| 0.5 * (f[[x, y]] + f[[x, (y + 1).min(n - 1)]]))
}

struct Row {
    neighbours: Vec<usize>,
    rhs: f64,
}

fn assemble(bc: &BoundaryData, pbar: &Array2<f64>, qbar: &Array2<f64>) -> (SparseMatrix, DVector<f64>) {
    let rows: Vec<Row> = (0..bc.n_pixels())
        .into_par_iter()
        .map(|i| {
            let (x, y) = bc.inside[i];
            let mut neighbours = Vec::with_capacity(4);
            let mut rhs = 0.0;

            // (x, y + 1)
            if bc.north[i] != i {
                neighbours.push(bc.north[i]);
                rhs -= qbar[[x, y]];
            }
            // (x, y - 1)
            if bc.south[i] != i {
                neighbours.push(bc.south[i]);
                rhs += qbar[[x, y - 1]];
            }
            // (x - 1, y)
            if bc.west[i] != i {
                neighbours.push(bc.west[i]);
                rhs += pbar[[x - 1, y]];
            }
            // (x + 1, y)
            if bc.east[i] != i {
                neighbours.push(bc.east[i]);
                rhs -= pbar[[x, y]];
            }
            Row { neighbours, rhs }
        })
        .collect();

    let n = rows.len();
    let nnz = n + rows.iter().map(|r| r.neighbours.len()).sum::<usize>();
    let mut a = SparseMatrix::with_capacity(n, n, nnz);
    let mut b = DVector::zeros(n);
    for (i, row) in rows.into_iter().enumerate() {
        a.add(i, i, row.neighbours.len() as f64 + REGULARISATION);
        for j in row.neighbours {
            a.add(i, j, -1.0);
        }
        b[i] = row.rhs;
    }
    (a, b)
}
