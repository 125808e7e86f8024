use crate::{PhotometricDataset, Result};

/// Anything that can produce the images, mask and light directions of one
/// capture.
pub trait MeasurementSource {
    fn load(&self) -> Result<PhotometricDataset>;
}

/// Source backed by a dataset already in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    dataset: PhotometricDataset,
}

impl InMemorySource {
    pub fn new(dataset: PhotometricDataset) -> Self {
        Self { dataset }
    }
}

impl From<PhotometricDataset> for InMemorySource {
    fn from(dataset: PhotometricDataset) -> Self {
        Self::new(dataset)
    }
}

impl MeasurementSource for InMemorySource {
    fn load(&self) -> Result<PhotometricDataset> {
        Ok(self.dataset.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use ndarray::Array3;
    use ps_core::Mask;

    #[test]
    fn in_memory_source_returns_its_dataset() {
        let images = Array3::from_elem((2, 2, 3), 0.25);
        let ds = PhotometricDataset::new(images, Mask::full((2, 2)), DMatrix::identity(3, 3))
            .unwrap();
        let source = InMemorySource::from(ds);
        let loaded = source.load().unwrap();
        assert_eq!(loaded.intensities(1, 1), vec![0.25; 3]);
        assert_eq!(loaded.n_lights(), 3);
    }
}
