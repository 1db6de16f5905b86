//! Read-only views of the population handed to observers.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::cell::{CellCyclePhase, CellId, MutationState, ProliferativeType};
use crate::population::{CellPopulation, PopulationKind, TopologyError};
use crate::simulation::SimulationClock;

/// Per-cell record of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: CellId,
    pub location_index: usize,
    pub centre: DVec2,
    pub area: f64,
    pub phase: CellCyclePhase,
    pub proliferative_type: ProliferativeType,
    pub mutation_state: MutationState,
    pub generation: u32,
    /// Hours since last division
    pub age: f64,
    pub ode_values: Option<Vec<f64>>,
    pub ode_failure: bool,
}

/// Population state at the end of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub step: u64,
    /// Simulation time in hours
    pub time: f64,
    pub kind: PopulationKind,
    pub cells: Vec<CellRecord>,
    pub node_positions: Vec<DVec2>,
    /// Element node lists (vertex-based only)
    pub elements: Vec<Vec<usize>>,
    /// F / η per node, when requested
    pub node_velocities: Option<Vec<DVec2>>,
}

impl PopulationSnapshot {
    pub fn capture(population: &CellPopulation, clock: &SimulationClock) -> Result<Self, TopologyError> {
        let time = clock.time();
        let mut cells = Vec::with_capacity(population.num_cells());
        for cell in population.cells() {
            cells.push(CellRecord {
                id: cell.id,
                location_index: cell.location_index,
                centre: population.cell_centre(cell.id)?,
                area: population.element_area(cell.id)?,
                phase: cell.phase,
                proliferative_type: cell.proliferative_type,
                mutation_state: cell.mutation_state,
                generation: cell.generation,
                age: cell.age(time),
                ode_values: cell.ode_state.as_ref().map(|s| s.values.clone()),
                ode_failure: cell.flags.ode_failure,
            });
        }

        let elements = match population.as_vertex_based() {
            Some(vertex) => vertex.mesh().elements.iter().map(|e| e.nodes.clone()).collect(),
            None => Vec::new(),
        };

        Ok(Self {
            step: clock.step_count,
            time,
            kind: population.kind(),
            cells,
            node_positions: population.node_positions(),
            elements,
            node_velocities: None,
        })
    }

    pub fn with_node_velocities(mut self, velocities: Vec<DVec2>) -> Self {
        self.node_velocities = Some(velocities);
        self
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, id: CellId) -> Option<&CellRecord> {
        self.cells.iter().find(|c| c.id == id)
    }
}
