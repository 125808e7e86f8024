//! Measurement sources and surface sinks
//!
//! The estimation pipeline reads a [`PhotometricDataset`] from a
//! [`MeasurementSource`] and hands the resulting depth map to a
//! [`SurfaceSink`]:
//! - [`source`]: the loader contract and an in-memory source
//! - [`obj`]: heightfield export to Wavefront OBJ

pub mod obj;
pub mod source;

pub use obj::{HeightfieldMesh, ObjSink, SurfaceSink};
pub use source::{InMemorySource, MeasurementSource};

pub use ps_core::{Error, PhotometricDataset, Result};
