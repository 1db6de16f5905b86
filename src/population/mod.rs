//! Cell populations: cells plus their spatial representation.
//!
//! Two representations are supported:
//! - centre-based: one node per cell, neighbours by distance
//! - vertex-based: one polygon per cell, neighbours by shared edges
//!
//! In both, cells are stored in location order, so `cells[i]` occupies node
//! or element `i` and `cells[i].location_index == i`. Every mutation keeps
//! that bijection or returns a [`TopologyError`].

mod node_based;
mod vertex_based;

pub use node_based::NodeBasedCellPopulation;
pub use vertex_based::VertexBasedCellPopulation;

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{Cell, CellId};
use crate::geometry::{MeshError, Node};
use crate::physics::OverdampedIntegrator;

/// Structural errors from population mutations and queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("invalid mesh mutation: {0}")]
    Mesh(#[from] MeshError),

    #[error("no live cell with id {0}")]
    UnknownCell(CellId),

    #[error("cell id {0} appears more than once")]
    DuplicateCell(CellId),

    #[error("population has {cells} cells but {locations} spatial elements")]
    CountMismatch { cells: usize, locations: usize },

    #[error("cell {cell} stored at {stored} but records location index {recorded}")]
    LocationMismatch {
        cell: CellId,
        stored: usize,
        recorded: usize,
    },

    #[error("expected {expected} node vectors, got {actual}")]
    NodeCountMismatch { expected: usize, actual: usize },

    #[error("node {node} has non-finite position {position}")]
    NonFinitePosition { node: usize, position: DVec2 },
}

/// Which spatial representation a population uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationKind {
    CentreBased,
    VertexBased,
}

impl PopulationKind {
    pub fn label(self) -> &'static str {
        match self {
            PopulationKind::CentreBased => "centre-based",
            PopulationKind::VertexBased => "vertex-based",
        }
    }
}

/// A population of cells in one of the supported representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellPopulation {
    CentreBased(NodeBasedCellPopulation),
    VertexBased(VertexBasedCellPopulation),
}

impl From<NodeBasedCellPopulation> for CellPopulation {
    fn from(population: NodeBasedCellPopulation) -> Self {
        CellPopulation::CentreBased(population)
    }
}

impl From<VertexBasedCellPopulation> for CellPopulation {
    fn from(population: VertexBasedCellPopulation) -> Self {
        CellPopulation::VertexBased(population)
    }
}

impl CellPopulation {
    pub fn kind(&self) -> PopulationKind {
        match self {
            CellPopulation::CentreBased(_) => PopulationKind::CentreBased,
            CellPopulation::VertexBased(_) => PopulationKind::VertexBased,
        }
    }

    pub fn as_vertex_based(&self) -> Option<&VertexBasedCellPopulation> {
        match self {
            CellPopulation::VertexBased(p) => Some(p),
            CellPopulation::CentreBased(_) => None,
        }
    }

    pub fn as_vertex_based_mut(&mut self) -> Option<&mut VertexBasedCellPopulation> {
        match self {
            CellPopulation::VertexBased(p) => Some(p),
            CellPopulation::CentreBased(_) => None,
        }
    }

    pub fn as_centre_based(&self) -> Option<&NodeBasedCellPopulation> {
        match self {
            CellPopulation::CentreBased(p) => Some(p),
            CellPopulation::VertexBased(_) => None,
        }
    }

    /// Cells in location order.
    pub fn cells(&self) -> &[Cell] {
        match self {
            CellPopulation::CentreBased(p) => &p.cells,
            CellPopulation::VertexBased(p) => &p.cells,
        }
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        match self {
            CellPopulation::CentreBased(p) => &mut p.cells,
            CellPopulation::VertexBased(p) => &mut p.cells,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.cells().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        match self {
            CellPopulation::CentreBased(p) => &p.nodes,
            CellPopulation::VertexBased(p) => &p.mesh.nodes,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes().len()
    }

    pub fn node_positions(&self) -> Vec<DVec2> {
        self.nodes().iter().map(|n| n.position).collect()
    }

    pub fn damping_constant(&self) -> f64 {
        match self {
            CellPopulation::CentreBased(p) => p.damping_constant,
            CellPopulation::VertexBased(p) => p.damping_constant,
        }
    }

    /// Ids of all cells in location order.
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells().iter().map(|c| c.id).collect()
    }

    /// Location index of a cell.
    pub fn location_of(&self, id: CellId) -> Option<usize> {
        self.cells().iter().position(|c| c.id == id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells().iter().find(|c| c.id == id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells_mut().iter_mut().find(|c| c.id == id)
    }

    fn require_location(&self, id: CellId) -> Result<usize, TopologyError> {
        self.location_of(id).ok_or(TopologyError::UnknownCell(id))
    }

    /// Position of a cell: its node, or the centroid of its polygon.
    pub fn cell_centre(&self, id: CellId) -> Result<DVec2, TopologyError> {
        let index = self.require_location(id)?;
        Ok(match self {
            CellPopulation::CentreBased(p) => p.nodes[index].position,
            CellPopulation::VertexBased(p) => p.mesh.element_centroid(index),
        })
    }

    /// Neighbouring cells: within the interaction radius (centre-based) or
    /// sharing an edge (vertex-based).
    pub fn neighbours(&self, id: CellId) -> Result<BTreeSet<CellId>, TopologyError> {
        let index = self.require_location(id)?;
        Ok(match self {
            CellPopulation::CentreBased(p) => p.neighbours_of_location(index),
            CellPopulation::VertexBased(p) => p.neighbours_of_location(index),
        })
    }

    pub fn element_area(&self, id: CellId) -> Result<f64, TopologyError> {
        let index = self.require_location(id)?;
        Ok(match self {
            CellPopulation::CentreBased(p) => p.disc_area(),
            CellPopulation::VertexBased(p) => p.mesh.element_area(index),
        })
    }

    /// In two dimensions the volume of a cell is its area.
    pub fn element_volume(&self, id: CellId) -> Result<f64, TopologyError> {
        self.element_area(id)
    }

    /// Move every non-fixed node by `dt * F / damping`.
    pub fn update_node_positions(&mut self, forces: &[DVec2], dt: f64) -> Result<(), TopologyError> {
        let proposed = OverdampedIntegrator::unlimited().propose(self, forces, dt)?;
        self.set_node_positions(&proposed)
    }

    /// Overwrite node positions, e.g. with boundary-corrected proposals.
    pub fn set_node_positions(&mut self, positions: &[DVec2]) -> Result<(), TopologyError> {
        let nodes: &mut Vec<Node> = match self {
            CellPopulation::CentreBased(p) => &mut p.nodes,
            CellPopulation::VertexBased(p) => &mut p.mesh.nodes,
        };
        if positions.len() != nodes.len() {
            return Err(TopologyError::NodeCountMismatch {
                expected: nodes.len(),
                actual: positions.len(),
            });
        }
        for (index, (node, &position)) in nodes.iter_mut().zip(positions).enumerate() {
            if !position.is_finite() {
                return Err(TopologyError::NonFinitePosition { node: index, position });
            }
            node.position = position;
        }
        Ok(())
    }

    /// Reserve a fresh cell id.
    pub fn allocate_cell_id(&mut self) -> CellId {
        match self {
            CellPopulation::CentreBased(p) => p.allocate_cell_id(),
            CellPopulation::VertexBased(p) => p.allocate_cell_id(),
        }
    }

    /// The id the next call to [`allocate_cell_id`](Self::allocate_cell_id) returns.
    pub fn next_cell_id(&self) -> CellId {
        match self {
            CellPopulation::CentreBased(p) => CellId(p.next_cell_id),
            CellPopulation::VertexBased(p) => CellId(p.next_cell_id),
        }
    }

    /// Insert `daughter` next to its parent.
    ///
    /// Centre-based: the parent moves to `centre - v`, the daughter is placed
    /// at `centre + v`. Vertex-based: the parent polygon is split through its
    /// centroid along `v`, or along its short axis when `v` is zero.
    pub fn add_cell(
        &mut self,
        daughter: Cell,
        parent: CellId,
        division_vector: DVec2,
    ) -> Result<CellId, TopologyError> {
        let index = self.require_location(parent)?;
        if self.location_of(daughter.id).is_some() {
            return Err(TopologyError::DuplicateCell(daughter.id));
        }
        let id = daughter.id;
        match self {
            CellPopulation::CentreBased(p) => p.add_cell_at(daughter, index, division_vector),
            CellPopulation::VertexBased(p) => p.add_cell_at(daughter, index, division_vector)?,
        }
        log::debug!("Cell {} divided, daughter {}", parent, id);
        Ok(id)
    }

    /// Remove a cell and its spatial element.
    ///
    /// Vertex-based populations collapse the polygon to its centroid and
    /// re-stitch the neighbours.
    pub fn remove_cell(&mut self, id: CellId) -> Result<(), TopologyError> {
        let index = self.require_location(id)?;
        match self {
            CellPopulation::CentreBased(p) => p.remove_location(index),
            CellPopulation::VertexBased(p) => p.remove_location(index)?,
        }
        log::debug!("Cell {} removed", id);
        Ok(())
    }

    /// Remove every cell flagged dead, in ascending id order.
    pub fn remove_dead_cells(&mut self) -> Result<Vec<CellId>, TopologyError> {
        let mut dead: Vec<CellId> = self
            .cells()
            .iter()
            .filter(|c| c.is_dead())
            .map(|c| c.id)
            .collect();
        dead.sort();
        for &id in &dead {
            self.remove_cell(id)?;
        }
        Ok(dead)
    }

    /// Verify the cell/element bijection and the structure of the mesh.
    pub fn check_invariants(&self) -> Result<(), TopologyError> {
        let locations = match self {
            CellPopulation::CentreBased(p) => p.nodes.len(),
            CellPopulation::VertexBased(p) => {
                p.mesh.check_consistency()?;
                p.mesh.num_elements()
            }
        };

        let cells = self.cells();
        if cells.len() != locations {
            return Err(TopologyError::CountMismatch {
                cells: cells.len(),
                locations,
            });
        }

        for (stored, cell) in cells.iter().enumerate() {
            if cell.location_index != stored {
                return Err(TopologyError::LocationMismatch {
                    cell: cell.id,
                    stored,
                    recorded: cell.location_index,
                });
            }
        }
        check_unique_ids(cells)
    }
}

/// Reassign `location_index` from storage order.
fn reindex(cells: &mut [Cell]) {
    for (index, cell) in cells.iter_mut().enumerate() {
        cell.location_index = index;
    }
}

fn check_unique_ids(cells: &[Cell]) -> Result<(), TopologyError> {
    let mut seen = BTreeSet::new();
    for cell in cells {
        if !seen.insert(cell.id) {
            return Err(TopologyError::DuplicateCell(cell.id));
        }
    }
    Ok(())
}

/// First id not used by any of `cells`.
fn first_free_id(cells: &[Cell]) -> u64 {
    cells.iter().map(|c| c.id.0 + 1).max().unwrap_or(0)
}
