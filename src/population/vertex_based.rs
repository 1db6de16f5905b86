//! Vertex-based population: every cell is a polygon of a shared mesh.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{check_unique_ids, first_free_id, reindex, TopologyError};
use crate::cell::{Cell, CellId};
use crate::geometry::{MeshError, VertexMesh};

/// Cells as the elements of a [`VertexMesh`], element `i` owned by cell `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexBasedCellPopulation {
    pub(crate) mesh: VertexMesh,
    pub(crate) cells: Vec<Cell>,
    pub damping_constant: f64,
    pub(crate) next_cell_id: u64,
}

impl VertexBasedCellPopulation {
    /// One cell per mesh element, in element order.
    pub fn new(mesh: VertexMesh, mut cells: Vec<Cell>) -> Result<Self, TopologyError> {
        if mesh.num_elements() != cells.len() {
            return Err(TopologyError::CountMismatch {
                cells: cells.len(),
                locations: mesh.num_elements(),
            });
        }
        mesh.check_consistency()?;
        reindex(&mut cells);
        check_unique_ids(&cells)?;

        Ok(Self {
            mesh,
            next_cell_id: first_free_id(&cells),
            cells,
            damping_constant: 1.0,
        })
    }

    pub fn mesh(&self) -> &VertexMesh {
        &self.mesh
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell owning element `index`.
    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub(crate) fn neighbours_of_location(&self, index: usize) -> BTreeSet<CellId> {
        self.mesh
            .neighbouring_elements(index)
            .into_iter()
            .map(|e| self.cells[e].id)
            .collect()
    }

    pub(crate) fn allocate_cell_id(&mut self) -> CellId {
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        id
    }

    /// Split the parent's polygon and attach the daughter to the new half.
    pub(crate) fn add_cell_at(
        &mut self,
        mut daughter: Cell,
        parent_index: usize,
        division_vector: DVec2,
    ) -> Result<(), TopologyError> {
        let axis = if division_vector.length_squared() > 0.0 {
            division_vector.normalize()
        } else {
            self.mesh.element_short_axis(parent_index)
        };

        let element = self.mesh.divide_element_along_axis(parent_index, axis)?;
        debug_assert_eq!(element, self.cells.len());

        daughter.location_index = element;
        self.next_cell_id = self.next_cell_id.max(daughter.id.0 + 1);
        self.cells.push(daughter);
        Ok(())
    }

    /// Collapse the element at `index` to its centroid and drop its cell.
    pub(crate) fn remove_location(&mut self, index: usize) -> Result<(), MeshError> {
        self.mesh.collapse_element(index)?;
        self.cells.remove(index);
        reindex(&mut self.cells);
        Ok(())
    }
}
