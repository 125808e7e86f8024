use crate::{Error, Mask, Result};
use nalgebra::DMatrix;
use ndarray::{s, Array3};

/// Images of a static scene under `K` known light directions.
///
/// `images` is `(m, n, K)`, `lights` is `(K, 3)` with one unit direction per
/// row, `mask` is `(m, n)`.
#[derive(Debug, Clone)]
pub struct PhotometricDataset {
    images: Array3<f64>,
    mask: Mask,
    lights: DMatrix<f64>,
}

impl PhotometricDataset {
    pub fn new(images: Array3<f64>, mask: Mask, lights: DMatrix<f64>) -> Result<Self> {
        let (m, n, k) = images.dim();
        mask.check_shape((m, n), "image stack")?;
        if lights.ncols() != 3 {
            return Err(Error::DimensionMismatch(format!(
                "light matrix must be K x 3, got {} x {}",
                lights.nrows(),
                lights.ncols()
            )));
        }
        if lights.nrows() != k {
            return Err(Error::DimensionMismatch(format!(
                "{} images for {} light directions",
                k,
                lights.nrows()
            )));
        }
        if k < 3 {
            return Err(Error::InvalidInput(format!(
                "at least 3 light directions are needed, got {}",
                k
            )));
        }
        Ok(Self {
            images,
            mask,
            lights,
        })
    }

    pub fn images(&self) -> &Array3<f64> {
        &self.images
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn lights(&self) -> &DMatrix<f64> {
        &self.lights
    }

    /// `(m, n)`
    pub fn shape(&self) -> (usize, usize) {
        self.mask.shape()
    }

    pub fn n_lights(&self) -> usize {
        self.lights.nrows()
    }

    /// The `K` intensities observed at pixel `(x, y)`.
    pub fn intensities(&self, x: usize, y: usize) -> Vec<f64> {
        self.images.slice(s![x, y, ..]).to_vec()
    }
}
