use ndarray::Array2;
use ps_core::{Error, Mask, Result};

/// Adjacency of in-domain pixels, built once per mask.
///
/// For in-domain pixel `i` at `(x, y)`:
/// - `west[i]`  is the domain index of `(x - 1, y)`
/// - `north[i]` is the domain index of `(x, y + 1)`
/// - `east[i]`  is the domain index of `(x + 1, y)`
/// - `south[i]` is the domain index of `(x, y - 1)`
///
/// A neighbour outside the grid or outside the mask is replaced by `i`
/// itself, which gives iterative stencils a zero-flux boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryData {
    pub west: Vec<usize>,
    pub north: Vec<usize>,
    pub east: Vec<usize>,
    pub south: Vec<usize>,
    /// In-domain coordinates, row-major; position is the domain index.
    pub inside: Vec<(usize, usize)>,
    index: Array2<Option<usize>>,
}

impl BoundaryData {
    pub fn from_mask(mask: &Mask) -> Self {
        let inside: Vec<(usize, usize)> = mask.inside().collect();
        let mut index = Array2::from_elem(mask.shape(), None);
        for (i, &(x, y)) in inside.iter().enumerate() {
            index[[x, y]] = Some(i);
        }

        let link = |i: usize, x: isize, y: isize| -> usize {
            if mask.contains(x, y) {
                index[[x as usize, y as usize]].unwrap_or(i)
            } else {
                i
            }
        };

        let n_pixels = inside.len();
        let mut west = Vec::with_capacity(n_pixels);
        let mut north = Vec::with_capacity(n_pixels);
        let mut east = Vec::with_capacity(n_pixels);
        let mut south = Vec::with_capacity(n_pixels);

        for (i, &(x, y)) in inside.iter().enumerate() {
            let (x, y) = (x as isize, y as isize);
            west.push(link(i, x - 1, y));
            north.push(link(i, x, y + 1));
            east.push(link(i, x + 1, y));
            south.push(link(i, x, y - 1));
        }

        Self {
            west,
            north,
            east,
            south,
            inside,
            index,
        }
    }

    /// Number of in-domain pixels.
    pub fn n_pixels(&self) -> usize {
        self.inside.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.index.dim()
    }

    /// Domain index of grid pixel `(x, y)`, `None` outside the domain.
    pub fn domain_index(&self, x: usize, y: usize) -> Option<usize> {
        self.index.get((x, y)).copied().flatten()
    }

    /// The four links of pixel `i` in west, north, east, south order.
    pub fn links(&self, i: usize) -> [usize; 4] {
        [self.west[i], self.north[i], self.east[i], self.south[i]]
    }

    /// Fail unless this adjacency was built for a mask of the same shape.
    pub fn check_mask(&self, mask: &Mask) -> Result<()> {
        if self.shape() != mask.shape() || self.n_pixels() != mask.count() {
            return Err(Error::DimensionMismatch(format!(
                "boundary data built for {:?} with {} pixels, mask is {:?} with {}",
                self.shape(),
                self.n_pixels(),
                mask.shape(),
                mask.count()
            )));
        }
        Ok(())
    }
}
