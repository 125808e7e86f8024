//! Pixel-grid data model.
//!
//! Coordinates are `(x, y)` with `x` the row (axis 0) and `y` the column
//! (axis 1). Everything derived from a mask enumerates in-domain pixels in
//! row-major order.

use crate::{Error, Result};
use nalgebra::Vector3;
use ndarray::Array2;

/// Depth map over the grid; samples outside the domain are NaN.
pub type DepthMap = Array2<f64>;

/// Normal used outside the domain when a field is written back to the grid.
pub const PLACEHOLDER_NORMAL: [f64; 3] = [0.0, 0.0, 1.0];

/// Binary inclusion mask defining the integration domain.
///
/// The mask is immutable once built: every algorithm borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Mask {
    pub fn new(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Mask covering the whole `(m, n)` grid.
    pub fn full(shape: (usize, usize)) -> Self {
        Self::new(Array2::from_elem(shape, true))
    }

    pub fn from_fn<F>(shape: (usize, usize), mut f: F) -> Self
    where
        F: FnMut((usize, usize)) -> bool,
    {
        Self::new(Array2::from_shape_fn(shape, |idx| f(idx)))
    }

    /// Threshold a numeric mask: strictly positive values are inside.
    pub fn from_values(values: &Array2<f64>) -> Self {
        Self::new(values.mapv(|v| v > 0.0))
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// `false` for coordinates outside the grid.
    pub fn contains(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.data
            .get((x as usize, y as usize))
            .copied()
            .unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.data
    }

    /// In-domain coordinates in row-major order.
    pub fn inside(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter_map(|(idx, &inside)| inside.then_some(idx))
    }

    pub fn check_shape(&self, shape: (usize, usize), what: &str) -> Result<()> {
        if self.shape() != shape {
            return Err(Error::DimensionMismatch(format!(
                "{} has shape {:?}, mask has shape {:?}",
                what,
                shape,
                self.shape()
            )));
        }
        Ok(())
    }
}

/// Per-pixel unit normals stored as three same-shaped component planes.
///
/// `n1`, `n2`, `n3` are the x, y and z components. Unit length is expected
/// but not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalField {
    pub n1: Array2<f64>,
    pub n2: Array2<f64>,
    pub n3: Array2<f64>,
}

impl NormalField {
    pub fn new(n1: Array2<f64>, n2: Array2<f64>, n3: Array2<f64>) -> Result<Self> {
        if n1.dim() != n2.dim() || n1.dim() != n3.dim() {
            return Err(Error::DimensionMismatch(format!(
                "Normal components differ in shape: {:?}, {:?}, {:?}",
                n1.dim(),
                n2.dim(),
                n3.dim()
            )));
        }
        Ok(Self { n1, n2, n3 })
    }

    /// Field filled with the placeholder normal `(0, 0, 1)`.
    pub fn flat(shape: (usize, usize)) -> Self {
        Self {
            n1: Array2::from_elem(shape, PLACEHOLDER_NORMAL[0]),
            n2: Array2::from_elem(shape, PLACEHOLDER_NORMAL[1]),
            n3: Array2::from_elem(shape, PLACEHOLDER_NORMAL[2]),
        }
    }

    pub fn from_fn<F>(shape: (usize, usize), mut f: F) -> Self
    where
        F: FnMut((usize, usize)) -> Vector3<f64>,
    {
        let mut field = Self::flat(shape);
        for x in 0..shape.0 {
            for y in 0..shape.1 {
                field.set(x, y, f((x, y)));
            }
        }
        field
    }

    pub fn shape(&self) -> (usize, usize) {
        self.n1.dim()
    }

    pub fn get(&self, x: usize, y: usize) -> Vector3<f64> {
        Vector3::new(self.n1[[x, y]], self.n2[[x, y]], self.n3[[x, y]])
    }

    pub fn set(&mut self, x: usize, y: usize, v: Vector3<f64>) {
        self.n1[[x, y]] = v.x;
        self.n2[[x, y]] = v.y;
        self.n3[[x, y]] = v.z;
    }

    /// Vectors at the given coordinates, in order.
    pub fn gather(&self, coords: &[(usize, usize)]) -> Vec<Vector3<f64>> {
        coords.iter().map(|&(x, y)| self.get(x, y)).collect()
    }

    /// Write `values` at `coords`; every other pixel gets the placeholder.
    pub fn scatter(
        shape: (usize, usize),
        coords: &[(usize, usize)],
        values: &[Vector3<f64>],
    ) -> Self {
        let mut field = Self::flat(shape);
        for (&(x, y), v) in coords.iter().zip(values) {
            field.set(x, y, *v);
        }
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_contains_rejects_out_of_grid() {
        let mask = Mask::full((3, 4));
        assert!(mask.contains(0, 0));
        assert!(mask.contains(2, 3));
        assert!(!mask.contains(-1, 0));
        assert!(!mask.contains(0, 4));
        assert!(!mask.contains(3, 0));
    }

    #[test]
    fn mask_inside_is_row_major() {
        let mask = Mask::from_fn((2, 3), |(x, y)| (x + y) % 2 == 0);
        let inside: Vec<_> = mask.inside().collect();
        assert_eq!(inside, vec![(0, 0), (0, 2), (1, 1)]);
        assert_eq!(mask.count(), 3);
    }

    #[test]
    fn normal_field_rejects_mismatched_planes() {
        let a = Array2::zeros((2, 2));
        let b = Array2::zeros((2, 3));
        assert!(NormalField::new(a.clone(), a.clone(), b).is_err());
        assert!(NormalField::new(a.clone(), a.clone(), a).is_ok());
    }

    #[test]
    fn scatter_fills_placeholder_outside() {
        let coords = [(0, 1)];
        let values = [Vector3::new(1.0, 0.0, 0.0)];
        let field = NormalField::scatter((2, 2), &coords, &values);
        assert_eq!(field.get(0, 1), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(field.get(1, 1), Vector3::new(0.0, 0.0, 1.0));
    }
}
