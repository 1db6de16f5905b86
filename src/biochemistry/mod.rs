//! Sub-cellular biochemistry: per-cell ODE systems and their integration.
//!
//! A cell may carry an [`OdeState`], the state vector of some [`OdeSystem`]
//! together with the time it is valid at. The lifecycle pass advances every
//! state once per mechanics step through [`OdeStateIntegrator`], feeding in a
//! coupling input aggregated from the cell's neighbours.
//!
//! Built-in systems:
//! - Delta-Notch lateral inhibition (Collier et al., J Theor Biol 1996)

pub mod delta_notch;
pub mod integrator;

pub use delta_notch::{DeltaNotchOdeSystem, DeltaNotchParameters};
pub use integrator::{
    ForwardEuler, IntegratorConfig, OdeError, OdeIntegrator, OdeSolverKind, OdeStateIntegrator,
    RungeKutta4,
};

use serde::{Deserialize, Serialize};

/// Right-hand side of a system of ODEs, dy/dt = f(t, y).
///
/// Systems carry parameters only; the state lives in each cell's
/// [`OdeState`], so one system instance serves the whole population.
pub trait OdeSystem: std::fmt::Debug {
    /// Identifier used in logs and parameter dumps
    fn name(&self) -> &str;

    fn num_variables(&self) -> usize;

    /// Names of the state variables, in state-vector order
    fn variable_names(&self) -> &[&'static str];

    fn initial_conditions(&self) -> Vec<f64>;

    /// Fill `dydt` with the derivatives at `(time, y)`
    fn evaluate(&self, time: f64, y: &[f64], dydt: &mut [f64]);

    /// Write an externally aggregated signal (e.g. mean neighbour Delta)
    /// into the state before integration.
    fn apply_coupling(&self, _y: &mut [f64], _input: f64) {}

    /// The signal this cell exposes to its neighbours, if any.
    fn coupling_output(&self, _y: &[f64]) -> Option<f64> {
        None
    }

    /// Index of a named state variable.
    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names().iter().position(|&n| n == name)
    }
}

/// ODE state vector and the simulation time it is valid at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeState {
    pub values: Vec<f64>,
    pub valid_at: f64,
}

impl OdeState {
    pub fn new(values: Vec<f64>, valid_at: f64) -> Self {
        Self { values, valid_at }
    }

    /// Fresh state at the system's initial conditions.
    pub fn initial(system: &dyn OdeSystem, time: f64) -> Self {
        Self::new(system.initial_conditions(), time)
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}
