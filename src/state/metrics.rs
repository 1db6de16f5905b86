//! Population summary metrics for logging and time-series export.

use serde::{Deserialize, Serialize};

use super::PopulationSnapshot;
use crate::cell::{CellCyclePhase, ProliferativeType};

/// Aggregate statistics of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationMetrics {
    pub step: u64,
    /// Simulation time in hours
    pub time: f64,
    pub num_cells: usize,
    pub num_nodes: usize,
    pub total_area: f64,
    pub mean_area: f64,
    pub stem_cells: usize,
    pub transit_cells: usize,
    pub differentiated_cells: usize,
    /// Cells currently in M phase
    pub mitotic_cells: usize,
    /// Mean of the first ODE variable over cells that carry one
    pub mean_ode_0: Option<f64>,
    pub mean_ode_1: Option<f64>,
}

impl From<&PopulationSnapshot> for PopulationMetrics {
    fn from(snapshot: &PopulationSnapshot) -> Self {
        let num_cells = snapshot.cells.len();
        let total_area: f64 = snapshot.cells.iter().map(|c| c.area).sum();
        let count = |t: ProliferativeType| {
            snapshot
                .cells
                .iter()
                .filter(|c| c.proliferative_type == t)
                .count()
        };

        let mean_ode = |index: usize| {
            let values: Vec<f64> = snapshot
                .cells
                .iter()
                .filter_map(|c| c.ode_values.as_ref().and_then(|v| v.get(index).copied()))
                .collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        };

        Self {
            step: snapshot.step,
            time: snapshot.time,
            num_cells,
            num_nodes: snapshot.node_positions.len(),
            total_area,
            mean_area: if num_cells > 0 { total_area / num_cells as f64 } else { 0.0 },
            stem_cells: count(ProliferativeType::Stem),
            transit_cells: count(ProliferativeType::Transit),
            differentiated_cells: count(ProliferativeType::Differentiated),
            mitotic_cells: snapshot
                .cells
                .iter()
                .filter(|c| c.phase == CellCyclePhase::M)
                .count(),
            mean_ode_0: mean_ode(0),
            mean_ode_1: mean_ode(1),
        }
    }
}
