//! Honeycomb tissue generators.
//!
//! Produces a sheet of regular hexagons (pointy-top orientation) with shared
//! vertices for vertex-based populations, and the matching hexagonally
//! packed cell centres for centre-based populations.
//!
//! Rows are offset by half a cell width on odd rows:
//! ```text
//!   / \ / \ / \
//!  |   |   |   |
//!   \ / \ / \ / \
//!    |   |   |   |
//!     \ / \ / \ /
//! ```

use std::collections::BTreeMap;

use glam::DVec2;

use super::mesh::{MeshError, VertexMesh};

/// Quantisation used to merge coincident hexagon corners.
const MERGE_SCALE: f64 = 1e6;

/// Generator for a `num_across` x `num_up` block of hexagonal cells.
#[derive(Debug, Clone)]
pub struct HoneycombGenerator {
    pub num_across: usize,
    pub num_up: usize,
    /// Area of each hexagon
    pub cell_area: f64,
}

impl HoneycombGenerator {
    pub fn new(num_across: usize, num_up: usize) -> Self {
        Self {
            num_across,
            num_up,
            cell_area: 1.0,
        }
    }

    /// Circumradius of a regular hexagon with the configured area.
    ///
    /// A = (3√3 / 2) r²
    pub fn circumradius(&self) -> f64 {
        (2.0 * self.cell_area / (3.0 * 3.0_f64.sqrt())).sqrt()
    }

    /// Centre of hexagon `(i, j)`.
    fn centre(&self, i: usize, j: usize) -> DVec2 {
        let r = self.circumradius();
        let width = 3.0_f64.sqrt() * r;
        let offset = if j % 2 == 1 { 0.5 * width } else { 0.0 };
        DVec2::new(width * i as f64 + offset, 1.5 * r * j as f64)
    }

    /// Cell centres in row-major order, the same order as the mesh elements.
    pub fn centres(&self) -> Vec<DVec2> {
        let mut centres = Vec::with_capacity(self.num_across * self.num_up);
        for j in 0..self.num_up {
            for i in 0..self.num_across {
                centres.push(self.centre(i, j));
            }
        }
        centres
    }

    /// Build the vertex mesh. Elements are numbered row by row.
    pub fn generate(&self) -> Result<VertexMesh, MeshError> {
        let r = self.circumradius();
        let mut positions: Vec<DVec2> = Vec::new();
        let mut lookup: BTreeMap<(i64, i64), usize> = BTreeMap::new();
        let mut elements = Vec::with_capacity(self.num_across * self.num_up);

        for centre in self.centres() {
            let mut element = Vec::with_capacity(6);
            // Corners at 30° + 60°k, counter-clockwise
            for k in 0..6 {
                let angle = std::f64::consts::FRAC_PI_6 + k as f64 * std::f64::consts::FRAC_PI_3;
                let corner = centre + r * DVec2::from_angle(angle);
                let key = (
                    (corner.x * MERGE_SCALE).round() as i64,
                    (corner.y * MERGE_SCALE).round() as i64,
                );
                let index = *lookup.entry(key).or_insert_with(|| {
                    positions.push(corner);
                    positions.len() - 1
                });
                element.push(index);
            }
            elements.push(element);
        }

        log::debug!(
            "Generated honeycomb: {} elements, {} nodes",
            elements.len(),
            positions.len()
        );
        VertexMesh::new(positions, elements)
    }
}
