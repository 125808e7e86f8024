//! Integration of a normal field into a depth map.
//!
//! Both integrators read the surface gradient from the normals as
//! `p = -n2/n3` (derivative along axis 0) and `q = -n1/n3` (along axis 1), and
//! solve the Neumann Poisson problem `Δz = div(p, q)` up to an additive
//! constant. Samples outside the mask come back as NaN.

mod simchony;
mod unbiased;

pub use simchony::simchony_integrate;
pub use unbiased::unbiased_integrate;

use ndarray::{Array2, Zip};
use ps_core::{DepthMap, Error, Mask, NormalField, Result};

/// Discretisation of the gradient along each edge of the sparse system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationOrder {
    /// Gradient sampled at the pixel.
    First,
    /// Gradient averaged with the next pixel along the edge (midpoint rule).
    #[default]
    Second,
}

impl TryFrom<u8> for IntegrationOrder {
    type Error = Error;

    fn try_from(order: u8) -> Result<Self> {
        match order {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(Error::InvalidInput(format!(
                "integration order must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// Selects one of the integrators at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrator {
    /// Cosine-transform Poisson solver over the full rectangle.
    #[default]
    Simchony,
    /// Sparse direct solve over the masked domain.
    Unbiased { order: IntegrationOrder },
}

impl Integrator {
    pub fn integrate(&self, normals: &NormalField, mask: &Mask) -> Result<DepthMap> {
        match *self {
            Self::Simchony => simchony_integrate(normals, mask),
            Self::Unbiased { order } => unbiased_integrate(normals, mask, order),
        }
    }
}

/// `(p, q) = (-n2/n3, -n1/n3)`; a sample with a non-finite ratio (grazing
/// normal, `n3 = 0`) is read as zero slope.
pub(crate) fn surface_gradient(normals: &NormalField) -> (Array2<f64>, Array2<f64>) {
    let slope = |num: &f64, den: &f64| {
        let v = -num / den;
        if v.is_finite() {
            v
        } else {
            0.0
        }
    };
    let p = Zip::from(&normals.n2).and(&normals.n3).map_collect(slope);
    let q = Zip::from(&normals.n1).and(&normals.n3).map_collect(slope);
    (p, q)
}

/// Grid of NaN with the given in-domain values written back.
pub(crate) fn depth_from_domain(
    shape: (usize, usize),
    coords: &[(usize, usize)],
    values: impl IntoIterator<Item = f64>,
) -> DepthMap {
    let mut z = Array2::from_elem(shape, f64::NAN);
    for (&(x, y), v) in coords.iter().zip(values) {
        z[[x, y]] = v;
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn order_from_integer() {
        assert_eq!(IntegrationOrder::try_from(1).unwrap(), IntegrationOrder::First);
        assert_eq!(IntegrationOrder::try_from(2).unwrap(), IntegrationOrder::Second);
        assert!(matches!(
            IntegrationOrder::try_from(3),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn gradient_reads_slopes_and_guards_grazing_normals() {
        let mut field = NormalField::flat((1, 2));
        field.set(0, 0, Vector3::new(-0.6, 0.0, 0.8));
        field.set(0, 1, Vector3::new(1.0, 0.0, 0.0));
        let (p, q) = surface_gradient(&field);
        assert_eq!(p[[0, 0]], 0.0);
        assert!((q[[0, 0]] - 0.75).abs() < 1e-15);
        assert_eq!(p[[0, 1]], 0.0);
        assert_eq!(q[[0, 1]], 0.0);
    }

    #[test]
    fn dispatch_reaches_both_solvers() {
        let mask = Mask::full((4, 4));
        let normals = NormalField::flat((4, 4));
        for integrator in [
            Integrator::Simchony,
            Integrator::Unbiased {
                order: IntegrationOrder::First,
            },
        ] {
            let z = integrator.integrate(&normals, &mask).unwrap();
            assert_eq!(z.dim(), (4, 4));
            assert!(z.iter().all(|v| v.abs() < 1e-9));
        }
    }
}
