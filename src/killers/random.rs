//! Random cell death.

use rand::Rng;

use super::CellKiller;
use crate::cell::CellId;
use crate::population::{CellPopulation, TopologyError};
use crate::simulation::SimulationContext;

/// Kills each live cell with a fixed probability per hour.
///
/// The hourly probability p is converted to a per-step probability
/// 1 - (1 - p)^dt so the death rate does not depend on the timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomCellKiller {
    pub probability_per_hour: f64,
}

impl RandomCellKiller {
    pub fn new(probability_per_hour: f64) -> Self {
        Self {
            probability_per_hour: probability_per_hour.clamp(0.0, 1.0),
        }
    }

    pub fn probability_per_step(&self, dt: f64) -> f64 {
        1.0 - (1.0 - self.probability_per_hour).powf(dt)
    }
}

impl CellKiller for RandomCellKiller {
    fn name(&self) -> &str {
        "RandomCellKiller"
    }

    fn check_and_kill(
        &mut self,
        population: &mut CellPopulation,
        context: &mut SimulationContext,
    ) -> Result<Vec<CellId>, TopologyError> {
        let p = self.probability_per_step(context.dt());
        let mut killed = Vec::new();

        // One draw per live cell, in location order
        for cell in population.cells_mut() {
            if cell.is_dead() {
                continue;
            }
            if context.rng.gen::<f64>() < p {
                cell.kill();
                killed.push(cell.id);
            }
        }
        Ok(killed)
    }
}
