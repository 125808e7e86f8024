//! Heightfield export to Wavefront OBJ
//!
//! Each defined depth sample `z[x, y]` becomes a vertex `v x y z`; NaN samples
//! are skipped. Every 2x2 block of defined samples is closed with two
//! triangles.

use crate::{Error, Result};
use nalgebra::Point3;
use ndarray::Array2;
use ps_core::DepthMap;
use std::io::Write;
use tracing::debug;

/// Consumer of a reconstructed surface.
pub trait SurfaceSink {
    fn consume(&mut self, depth: &DepthMap, albedo: Option<&Array2<f64>>) -> Result<()>;
}

/// Triangulated heightfield with optional per-vertex grey levels.
#[derive(Debug, Clone, Default)]
pub struct HeightfieldMesh {
    pub vertices: Vec<Point3<f64>>,
    /// Grey level in `[0, 1]` per vertex, when an albedo map was supplied.
    pub shades: Option<Vec<f64>>,
    /// Vertex indices (0-based), counter-clockwise seen from `+z`.
    pub faces: Vec<[usize; 3]>,
}

impl HeightfieldMesh {
    /// Build the mesh of `depth`.
    ///
    /// With `albedo`, each vertex is shaded `(max - albedo) / max` like the
    /// inverted grey map used for display; non-finite albedo shades as 0.
    pub fn from_depth(depth: &DepthMap, albedo: Option<&Array2<f64>>) -> Result<Self> {
        if let Some(a) = albedo {
            if a.dim() != depth.dim() {
                return Err(Error::DimensionMismatch(format!(
                    "albedo has shape {:?}, depth has shape {:?}",
                    a.dim(),
                    depth.dim()
                )));
            }
        }

        let mut index = Array2::from_elem(depth.dim(), None);
        let mut vertices = Vec::new();
        for ((x, y), &z) in depth.indexed_iter() {
            if z.is_finite() {
                index[[x, y]] = Some(vertices.len());
                vertices.push(Point3::new(x as f64, y as f64, z));
            }
        }

        let shades = albedo.map(|a| {
            let max = a
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(f64::NEG_INFINITY, f64::max);
            vertices
                .iter()
                .map(|p| {
                    let v = a[[p.x as usize, p.y as usize]];
                    if v.is_finite() && max > 0.0 {
                        ((max - v) / max).clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                })
                .collect()
        });

        let (m, n) = depth.dim();
        let mut faces = Vec::new();
        for x in 0..m.saturating_sub(1) {
            for y in 0..n.saturating_sub(1) {
                let corners = (
                    index[[x, y]],
                    index[[x + 1, y]],
                    index[[x + 1, y + 1]],
                    index[[x, y + 1]],
                );
                if let (Some(a), Some(b), Some(c), Some(d)) = corners {
                    faces.push([a, b, c]);
                    faces.push([a, c, d]);
                }
            }
        }

        Ok(Self {
            vertices,
            shades,
            faces,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (i, v) in self.vertices.iter().enumerate() {
            match &self.shades {
                Some(shades) => {
                    let g = shades[i];
                    writeln!(writer, "v {} {} {} {} {} {}", v.x, v.y, v.z, g, g, g)?;
                }
                None => writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?,
            }
        }

        for face in &self.faces {
            // OBJ uses 1-based indexing
            writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
        }

        Ok(())
    }
}

/// [`SurfaceSink`] writing each consumed surface as OBJ text.
#[derive(Debug)]
pub struct ObjSink<W: Write> {
    writer: W,
}

impl<W: Write> ObjSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SurfaceSink for ObjSink<W> {
    fn consume(&mut self, depth: &DepthMap, albedo: Option<&Array2<f64>>) -> Result<()> {
        let mesh = HeightfieldMesh::from_depth(depth, albedo)?;
        mesh.write(&mut self.writer)?;
        self.writer.flush()?;
        debug!(
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "wrote heightfield mesh"
        );
        Ok(())
    }
}
