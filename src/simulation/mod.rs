//! Time-stepping driver.
//!
//! One step runs, in this order:
//! 1. force evaluation on the current configuration
//! 2. overdamped position update, boundary conditions, commit
//! 3. lifecycle pass (ODEs, phases, divisions, killers)
//! 4. T2 maintenance (vertex-based populations)
//! 5. structural invariant check
//! 6. clock advance
//! 7. observer notification
//!
//! A run ends normally at the end time, or is aborted by an empty
//! population, an invalid topology mutation or a failing observer.

mod context;
mod lifecycle;

pub use context::{SimulationClock, SimulationContext};
pub use lifecycle::{LifecycleController, LifecycleReport};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biochemistry::{OdeState, OdeStateIntegrator, OdeSystem};
use crate::cell::{CellCycleModel, CellId};
use crate::config::{ConfigError, SimulationParameters};
use crate::export::SimulationObserver;
use crate::killers::{CellKiller, SkippedCandidate, T2SwapCellKiller, T2SwapReport};
use crate::physics::{BoundaryCondition, Force, ForceCollection, OverdampedIntegrator};
use crate::population::{CellPopulation, TopologyError};
use crate::state::{Checkpoint, PopulationSnapshot};

/// Running totals kept across steps and checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationCounters {
    pub births: u64,
    pub deaths: u64,
    pub t2_swaps: u64,
}

/// Events of one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Step count after the step
    pub step: u64,
    /// Time after the step
    pub time: f64,
    pub births: Vec<CellId>,
    pub deaths: Vec<CellId>,
    pub t2_swaps: Vec<CellId>,
    pub t2_skipped: Vec<SkippedCandidate>,
    pub ode_failures: Vec<CellId>,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid topology mutation: {0}")]
    Topology(#[from] TopologyError),

    #[error("cell population is empty")]
    EmptyPopulation,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("observer {observer} failed: {error}")]
    Output { observer: String, error: anyhow::Error },
}

/// How a run ended.
#[derive(Debug)]
pub enum SimulationStatus {
    Completed { steps: u64, time: f64 },
    Aborted { step: u64, time: f64, cause: SimulationError },
}

impl SimulationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, SimulationStatus::Completed { .. })
    }
}

/// Owns a population and everything that moves it forward in time.
pub struct Simulation {
    population: CellPopulation,
    context: SimulationContext,
    forces: ForceCollection,
    boundary_conditions: Vec<Box<dyn BoundaryCondition>>,
    integrator: OverdampedIntegrator,
    lifecycle: LifecycleController,
    killers: Vec<Box<dyn CellKiller>>,
    t2_swap: Option<T2SwapCellKiller>,
    observers: Vec<Box<dyn SimulationObserver>>,
    counters: SimulationCounters,
    record_node_velocities: bool,
    set_up: bool,
    finished: bool,
}

impl Simulation {
    /// Build a driver with no force laws, boundaries, killers or observers.
    ///
    /// Population-level mechanics parameters are copied into `population`.
    /// Vertex-based populations get a T2 maintenance pass with the
    /// configured threshold. Cells without a G1 duration draw one from the
    /// seeded stream, in location order.
    pub fn new(population: CellPopulation, params: &SimulationParameters) -> Result<Self, SimulationError> {
        let mut simulation = Self::build(population, params)?;
        let Simulation {
            population,
            context,
            lifecycle,
            ..
        } = &mut simulation;
        for cell in population.cells_mut() {
            lifecycle.cycle.assign_missing_g1(cell, &mut context.rng);
        }
        Ok(simulation)
    }

    fn build(mut population: CellPopulation, params: &SimulationParameters) -> Result<Self, SimulationError> {
        params.validate()?;

        let mechanics = &params.mechanics;
        match &mut population {
            CellPopulation::CentreBased(p) => {
                p.damping_constant = mechanics.damping_constant;
                p.cell_radius = mechanics.cell_radius;
                p.interaction_radius = mechanics.spring.cutoff;
            }
            CellPopulation::VertexBased(p) => {
                p.damping_constant = mechanics.damping_constant;
            }
        }
        population.check_invariants()?;

        let t2_swap = population
            .as_vertex_based()
            .map(|_| T2SwapCellKiller::new(params.vertex.t2_threshold));

        let clock = SimulationClock::new(params.time.start_time, params.time.end_time, params.time.dt);
        let lifecycle = LifecycleController::new(
            CellCycleModel::new(params.cell_cycle.clone()),
            OdeStateIntegrator::new(&params.ode.integrator),
            mechanics.spring.division_separation,
        );

        Ok(Self {
            population,
            context: SimulationContext::new(clock, params.seed),
            forces: ForceCollection::new(),
            boundary_conditions: Vec::new(),
            integrator: OverdampedIntegrator::new(mechanics.max_displacement),
            lifecycle,
            killers: Vec::new(),
            t2_swap,
            observers: Vec::new(),
            counters: SimulationCounters::default(),
            record_node_velocities: params.output.node_velocities,
            set_up: false,
            finished: false,
        })
    }

    /// Resume from a checkpoint. Force laws, boundaries, killers, observers
    /// and the ODE system must be attached again.
    pub fn restore(checkpoint: Checkpoint, params: &SimulationParameters) -> Result<Self, SimulationError> {
        let mut simulation = Self::build(checkpoint.population, params)?;
        simulation.context = checkpoint.context;
        simulation.counters = checkpoint.counters;
        log::info!(
            "Restored simulation at step {} (t = {:.4}) with {} cells",
            simulation.context.clock.step_count,
            simulation.context.time(),
            simulation.population.num_cells()
        );
        Ok(simulation)
    }

    /// Attach the sub-cellular ODE system. Cells without a state start from
    /// the system's initial conditions at the current time.
    pub fn with_ode_system(mut self, system: Box<dyn OdeSystem>) -> Self {
        let time = self.context.time();
        for cell in self.population.cells_mut() {
            if cell.ode_state.is_none() {
                cell.ode_state = Some(OdeState::initial(system.as_ref(), time));
            }
        }
        self.lifecycle.set_ode_system(system);
        self
    }

    pub fn add_force(&mut self, force: Box<dyn Force>) {
        self.forces.push(force);
    }

    pub fn add_boundary_condition(&mut self, condition: Box<dyn BoundaryCondition>) {
        self.boundary_conditions.push(condition);
    }

    pub fn add_cell_killer(&mut self, killer: Box<dyn CellKiller>) {
        self.killers.push(killer);
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    pub fn population(&self) -> &CellPopulation {
        &self.population
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn counters(&self) -> &SimulationCounters {
        &self.counters
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn time(&self) -> f64 {
        self.context.time()
    }

    pub fn step_count(&self) -> u64 {
        self.context.clock.step_count
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.context.clone(), self.counters.clone(), self.population.clone())
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> Result<PopulationSnapshot, TopologyError> {
        let snapshot = PopulationSnapshot::capture(&self.population, &self.context.clock)?;
        if !self.record_node_velocities {
            return Ok(snapshot);
        }
        let damping = self.population.damping_constant();
        let velocities = self
            .forces
            .compute_forces(&self.population, self.context.time())
            .into_iter()
            .map(|force| force / damping)
            .collect();
        Ok(snapshot.with_node_velocities(velocities))
    }

    /// Notify observers of the initial state. Runs once; later calls are
    /// no-ops.
    pub fn setup(&mut self) -> Result<(), SimulationError> {
        if self.set_up {
            return Ok(());
        }
        self.set_up = true;

        log::info!(
            "Simulation setup: {} population, {} cells, {} nodes, {} force laws, {} killers",
            self.population.kind().label(),
            self.population.num_cells(),
            self.population.num_nodes(),
            self.forces.len(),
            self.killers.len()
        );
        log::info!(
            "Running from t = {} to t = {} with dt = {} ({} steps, seed {})",
            self.context.clock.start_time,
            self.context.clock.end_time,
            self.context.dt(),
            self.context.clock.total_steps(),
            self.context.seed()
        );
        if let Some(system) = self.lifecycle.ode_system() {
            log::info!("ODE system: {} ({} variables)", system.name(), system.num_variables());
        }

        if self.observers.is_empty() {
            return Ok(());
        }
        let snapshot = self.snapshot()?;
        for observer in self.observers.iter_mut() {
            observer.on_setup(&snapshot).map_err(|error| SimulationError::Output {
                observer: observer.name().to_string(),
                error,
            })?;
        }
        Ok(())
    }

    /// Advance by exactly one timestep.
    pub fn step(&mut self) -> Result<StepReport, SimulationError> {
        self.setup()?;
        if self.population.is_empty() {
            return Err(SimulationError::EmptyPopulation);
        }

        let time = self.context.time();
        let dt = self.context.dt();

        let forces = self.forces.compute_forces(&self.population, time);
        let mut positions = self.integrator.propose(&self.population, &forces, dt)?;
        for condition in &self.boundary_conditions {
            condition.apply(&self.population, &mut positions);
        }
        self.population.set_node_positions(&positions)?;

        let lifecycle = self
            .lifecycle
            .run(&mut self.population, &mut self.killers, &mut self.context)?;

        let t2 = match (&self.t2_swap, self.population.as_vertex_based_mut()) {
            (Some(killer), Some(vertex)) => killer.scan(vertex)?,
            _ => T2SwapReport::default(),
        };

        self.population.check_invariants()?;

        self.context.clock.advance();

        self.counters.births += lifecycle.births.len() as u64;
        self.counters.deaths += lifecycle.deaths.len() as u64;
        self.counters.t2_swaps += t2.swapped.len() as u64;

        let report = StepReport {
            step: self.context.clock.step_count,
            time: self.context.time(),
            births: lifecycle.births,
            deaths: lifecycle.deaths,
            t2_swaps: t2.swapped,
            t2_skipped: t2.skipped,
            ode_failures: lifecycle.ode_failures,
        };

        if !self.observers.is_empty() {
            let snapshot = self.snapshot()?;
            for observer in self.observers.iter_mut() {
                observer
                    .on_step_end(&snapshot, &report)
                    .map_err(|error| SimulationError::Output {
                        observer: observer.name().to_string(),
                        error,
                    })?;
            }
        }

        Ok(report)
    }

    /// Notify observers that the run is over. Runs once.
    pub fn finish(&mut self) -> Result<(), SimulationError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        log::info!(
            "Simulation finished at step {} (t = {:.4}): {} cells, {} births, {} deaths, {} T2 swaps",
            self.step_count(),
            self.time(),
            self.population.num_cells(),
            self.counters.births,
            self.counters.deaths,
            self.counters.t2_swaps
        );

        if self.observers.is_empty() {
            return Ok(());
        }
        let snapshot = self.snapshot()?;
        for observer in self.observers.iter_mut() {
            observer.on_finish(&snapshot).map_err(|error| SimulationError::Output {
                observer: observer.name().to_string(),
                error,
            })?;
        }
        Ok(())
    }

    /// Run to the end time.
    pub fn solve(&mut self) -> SimulationStatus {
        if let Err(cause) = self.setup() {
            return self.abort(cause);
        }

        while !self.context.clock.is_finished() {
            if let Err(cause) = self.step() {
                return self.abort(cause);
            }
        }

        match self.finish() {
            Ok(()) => SimulationStatus::Completed {
                steps: self.step_count(),
                time: self.time(),
            },
            Err(cause) => {
                log::error!("Simulation failed while finishing: {}", cause);
                SimulationStatus::Aborted {
                    step: self.step_count(),
                    time: self.time(),
                    cause,
                }
            }
        }
    }

    fn abort(&mut self, cause: SimulationError) -> SimulationStatus {
        log::error!(
            "Simulation aborted at step {} (t = {:.4}): {}",
            self.step_count(),
            self.time(),
            cause
        );
        if let Err(e) = self.finish() {
            log::warn!("Observers failed after abort: {}", e);
        }
        SimulationStatus::Aborted {
            step: self.step_count(),
            time: self.time(),
            cause,
        }
    }
}
