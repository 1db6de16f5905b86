//! Centre-based population: every cell is a point node.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{check_unique_ids, first_free_id, reindex, TopologyError};
use crate::cell::{Cell, CellId};
use crate::geometry::{HoneycombGenerator, Node};

/// Cells as nodes, connected to every other node within
/// `interaction_radius`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBasedCellPopulation {
    pub(crate) nodes: Vec<Node>,
    pub(crate) cells: Vec<Cell>,
    /// Neighbour search radius, normally the mechanics cut-off
    pub interaction_radius: f64,
    /// Radius used to report cell areas
    pub cell_radius: f64,
    pub damping_constant: f64,
    pub(crate) next_cell_id: u64,
}

impl NodeBasedCellPopulation {
    /// One cell per position, in the same order.
    pub fn new(positions: Vec<DVec2>, mut cells: Vec<Cell>, interaction_radius: f64) -> Result<Self, TopologyError> {
        if positions.len() != cells.len() {
            return Err(TopologyError::CountMismatch {
                cells: cells.len(),
                locations: positions.len(),
            });
        }
        reindex(&mut cells);
        check_unique_ids(&cells)?;

        Ok(Self {
            nodes: positions.into_iter().map(Node::new).collect(),
            next_cell_id: first_free_id(&cells),
            cells,
            interaction_radius,
            cell_radius: 0.5,
            damping_constant: 1.0,
        })
    }

    /// Hexagonally packed block with unit spacing.
    pub fn honeycomb(
        num_across: usize,
        num_up: usize,
        cells: Vec<Cell>,
        interaction_radius: f64,
    ) -> Result<Self, TopologyError> {
        // Hexagons of area √3/2 have unit centre spacing
        let mut generator = HoneycombGenerator::new(num_across, num_up);
        generator.cell_area = 0.5 * 3.0_f64.sqrt();
        Self::new(generator.centres(), cells, interaction_radius)
    }

    pub fn disc_area(&self) -> f64 {
        std::f64::consts::PI * self.cell_radius * self.cell_radius
    }

    pub(crate) fn neighbours_of_location(&self, index: usize) -> BTreeSet<CellId> {
        let centre = self.nodes[index].position;
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(other, node)| other != index && within(node.position, centre, self.interaction_radius))
            .map(|(other, _)| self.cells[other].id)
            .collect()
    }

    /// Location index pairs `(i, j)`, `i < j`, at most `cutoff` apart.
    pub fn pairs_within(&self, cutoff: f64) -> Vec<(usize, usize)> {
        let n = self.nodes.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if within(self.nodes[i].position, self.nodes[j].position, cutoff) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    pub(crate) fn allocate_cell_id(&mut self) -> CellId {
        let id = CellId(self.next_cell_id);
        self.next_cell_id += 1;
        id
    }

    pub(crate) fn add_cell_at(&mut self, mut daughter: Cell, parent_index: usize, division_vector: DVec2) {
        let centre = self.nodes[parent_index].position;
        self.nodes[parent_index].position = centre - division_vector;

        daughter.location_index = self.nodes.len();
        self.nodes.push(Node::new(centre + division_vector));
        self.next_cell_id = self.next_cell_id.max(daughter.id.0 + 1);
        self.cells.push(daughter);
    }

    pub(crate) fn remove_location(&mut self, index: usize) {
        self.nodes.remove(index);
        self.cells.remove(index);
        reindex(&mut self.cells);
    }
}

/// Inclusive cut-off test shared by connectivity and force pairs.
fn within(a: DVec2, b: DVec2, radius: f64) -> bool {
    a.distance(b) <= radius
}
