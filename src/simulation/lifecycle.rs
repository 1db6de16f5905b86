//! Per-step cell lifecycle: ODE advance, phase update, division and death.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;

use super::SimulationContext;
use crate::biochemistry::{OdeStateIntegrator, OdeSystem};
use crate::cell::{CellCycleModel, CellId};
use crate::killers::CellKiller;
use crate::population::{CellPopulation, PopulationKind, TopologyError};

/// Cells born, killed and flagged during one lifecycle pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleReport {
    /// Daughter ids, in the order they were created
    pub births: Vec<CellId>,
    /// Ascending
    pub deaths: Vec<CellId>,
    pub ode_failures: Vec<CellId>,
}

/// Drives every cell through its cycle once per step.
#[derive(Debug)]
pub struct LifecycleController {
    pub cycle: CellCycleModel,
    ode_system: Option<Box<dyn OdeSystem>>,
    ode_integrator: OdeStateIntegrator,
    /// Distance between the two centres right after a centre-based division
    pub division_separation: f64,
}

impl LifecycleController {
    pub fn new(cycle: CellCycleModel, ode_integrator: OdeStateIntegrator, division_separation: f64) -> Self {
        Self {
            cycle,
            ode_system: None,
            ode_integrator,
            division_separation,
        }
    }

    pub fn set_ode_system(&mut self, system: Box<dyn OdeSystem>) {
        self.ode_system = Some(system);
    }

    pub fn ode_system(&self) -> Option<&dyn OdeSystem> {
        self.ode_system.as_deref()
    }

    /// Mean neighbour output of every cell, taken before any cell is
    /// advanced.
    fn coupling_inputs(&self, population: &CellPopulation) -> Result<BTreeMap<CellId, f64>, TopologyError> {
        let mut inputs = BTreeMap::new();
        let Some(system) = self.ode_system.as_deref() else {
            return Ok(inputs);
        };

        let outputs: BTreeMap<CellId, f64> = population
            .cells()
            .iter()
            .filter_map(|cell| {
                let state = cell.ode_state.as_ref()?;
                system.coupling_output(&state.values).map(|out| (cell.id, out))
            })
            .collect();
        if outputs.is_empty() {
            return Ok(inputs);
        }

        for cell in population.cells() {
            let neighbours = population.neighbours(cell.id)?;
            let (sum, count) = neighbours
                .iter()
                .filter_map(|n| outputs.get(n))
                .fold((0.0, 0usize), |(sum, count), out| (sum + out, count + 1));
            let input = if count == 0 { 0.0 } else { sum / count as f64 };
            inputs.insert(cell.id, input);
        }
        Ok(inputs)
    }

    fn division_vector<R: Rng + ?Sized>(&self, kind: PopulationKind, rng: &mut R) -> DVec2 {
        match kind {
            PopulationKind::CentreBased => {
                let angle = rng.gen_range(0.0..TAU);
                DVec2::from_angle(angle) * 0.5 * self.division_separation
            }
            // Vertex elements split along their short axis
            PopulationKind::VertexBased => DVec2::ZERO,
        }
    }

    /// Run one pass at the context's current time.
    ///
    /// Only cells present when the pass starts are visited, in location
    /// order. Killers run afterwards and dead cells are removed last.
    pub fn run(
        &mut self,
        population: &mut CellPopulation,
        killers: &mut [Box<dyn CellKiller>],
        context: &mut SimulationContext,
    ) -> Result<LifecycleReport, TopologyError> {
        let time = context.time();
        let mut report = LifecycleReport::default();
        let inputs = self.coupling_inputs(population)?;

        for id in population.cell_ids() {
            let Some(cell) = population.cell_mut(id) else {
                continue;
            };
            if cell.is_dead() {
                continue;
            }

            if let (Some(system), Some(state)) = (self.ode_system.as_deref(), cell.ode_state.as_ref()) {
                let input = inputs.get(&id).copied().unwrap_or(0.0);
                match self.ode_integrator.advance(system, state, time, input) {
                    Ok(next) => {
                        cell.ode_state = Some(next);
                        cell.flags.ode_failure = false;
                    }
                    Err(e) => {
                        log::warn!("ODE integration failed for cell {} at t = {:.4}: {}", id, time, e);
                        cell.flags.ode_failure = true;
                        report.ode_failures.push(id);
                    }
                }
            }

            self.cycle.update_phase(cell, time);
            if !self.cycle.is_ready_to_divide(cell, time, self.ode_system.as_deref()) {
                continue;
            }

            let parent_before = cell.clone();
            self.cycle.reset_for_division(cell, time, &mut context.rng);

            let daughter_id = population.allocate_cell_id();
            let daughter = self
                .cycle
                .create_daughter(&parent_before, daughter_id, time, &mut context.rng);
            let division_vector = self.division_vector(population.kind(), &mut context.rng);
            population.add_cell(daughter, id, division_vector)?;
            report.births.push(daughter_id);
        }

        let mut deaths = BTreeSet::new();
        for killer in killers.iter_mut() {
            let killed = killer.check_and_kill(population, context)?;
            if !killed.is_empty() {
                log::debug!("{} killed {} cells", killer.name(), killed.len());
            }
            deaths.extend(killed);
        }
        deaths.extend(population.remove_dead_cells()?);
        report.deaths = deaths.into_iter().collect();

        Ok(report)
    }
}
