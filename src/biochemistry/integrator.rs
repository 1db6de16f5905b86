//! Fixed-step ODE integration for per-cell state.
//!
//! Two explicit one-step methods are provided as interchangeable strategies:
//! forward Euler and the classical 4th-order Runge-Kutta scheme.
//!
//! RK4:
//! k1 = f(t, y)
//! k2 = f(t + h/2, y + h/2 * k1)
//! k3 = f(t + h/2, y + h/2 * k2)
//! k4 = f(t + h, y + h * k3)
//! y_new = y + h/6 * (k1 + 2*k2 + 2*k3 + k4)
//!
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{OdeState, OdeSystem};

/// Tolerance used when comparing sub-step end points with the target time.
const TIME_EPSILON: f64 = 1e-12;

/// Failures reported by ODE integration. None of these panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OdeError {
    #[error("ODE variable {variable} became non-finite at t = {time}")]
    NumericalDivergence { time: f64, variable: usize },

    #[error("cannot integrate backwards from t = {from} to t = {to}")]
    InvalidTimeRange { from: f64, to: f64 },

    #[error("state has {actual} variables, system expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// One-step method advancing `y` by `h` in place.
pub trait OdeIntegrator: std::fmt::Debug {
    fn step(&mut self, system: &dyn OdeSystem, time: f64, h: f64, y: &mut [f64]);

    /// Integrate from `start` to `end` with step size `dt`, truncating the
    /// final step so the end point is hit exactly.
    fn solve(
        &mut self,
        system: &dyn OdeSystem,
        y: &mut [f64],
        start: f64,
        end: f64,
        dt: f64,
    ) -> Result<(), OdeError> {
        if end < start {
            return Err(OdeError::InvalidTimeRange { from: start, to: end });
        }

        let mut time = start;
        while end - time > TIME_EPSILON {
            let h = dt.min(end - time);
            self.step(system, time, h, y);
            time += h;

            if let Some(variable) = y.iter().position(|v| !v.is_finite()) {
                return Err(OdeError::NumericalDivergence { time, variable });
            }
        }
        Ok(())
    }
}

/// Explicit first-order Euler method.
#[derive(Debug, Default, Clone)]
pub struct ForwardEuler {
    dydt: Vec<f64>,
}

impl OdeIntegrator for ForwardEuler {
    fn step(&mut self, system: &dyn OdeSystem, time: f64, h: f64, y: &mut [f64]) {
        self.dydt.resize(y.len(), 0.0);
        system.evaluate(time, y, &mut self.dydt);
        for (value, rate) in y.iter_mut().zip(&self.dydt) {
            *value += h * rate;
        }
    }
}

/// Classical 4th-order Runge-Kutta method.
#[derive(Debug, Default, Clone)]
pub struct RungeKutta4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    y_temp: Vec<f64>,
}

impl RungeKutta4 {
    /// Resize internal buffers if system size changes
    fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            self.k1.resize(n, 0.0);
            self.k2.resize(n, 0.0);
            self.k3.resize(n, 0.0);
            self.k4.resize(n, 0.0);
            self.y_temp.resize(n, 0.0);
        }
    }
}

impl OdeIntegrator for RungeKutta4 {
    fn step(&mut self, system: &dyn OdeSystem, time: f64, h: f64, y: &mut [f64]) {
        let n = y.len();
        self.resize(n);

        system.evaluate(time, y, &mut self.k1);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k1[i];
        }
        system.evaluate(time + 0.5 * h, &self.y_temp, &mut self.k2);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k2[i];
        }
        system.evaluate(time + 0.5 * h, &self.y_temp, &mut self.k3);

        for i in 0..n {
            self.y_temp[i] = y[i] + h * self.k3[i];
        }
        system.evaluate(time + h, &self.y_temp, &mut self.k4);

        let h_6 = h / 6.0;
        for i in 0..n {
            y[i] += h_6 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }
}

/// Which one-step method to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OdeSolverKind {
    ForwardEuler,
    #[default]
    RungeKutta4,
}

/// Configuration for per-cell ODE integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Internal ODE step in hours, independent of the mechanics timestep
    pub dt: f64,
    pub solver: OdeSolverKind,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            solver: OdeSolverKind::RungeKutta4,
        }
    }
}

/// Advances a cell's [`OdeState`] to a target time.
#[derive(Debug)]
pub struct OdeStateIntegrator {
    pub dt: f64,
    solver: Box<dyn OdeIntegrator>,
}

impl OdeStateIntegrator {
    pub fn new(config: &IntegratorConfig) -> Self {
        let solver: Box<dyn OdeIntegrator> = match config.solver {
            OdeSolverKind::ForwardEuler => Box::new(ForwardEuler::default()),
            OdeSolverKind::RungeKutta4 => Box::new(RungeKutta4::default()),
        };
        Self { dt: config.dt, solver }
    }

    /// Apply the coupling input, then integrate from `state.valid_at` to
    /// `target_time`.
    ///
    /// The input state is left untouched; on failure the caller decides what
    /// to do with the cell.
    pub fn advance(
        &mut self,
        system: &dyn OdeSystem,
        state: &OdeState,
        target_time: f64,
        coupling_input: f64,
    ) -> Result<OdeState, OdeError> {
        if state.values.len() != system.num_variables() {
            return Err(OdeError::DimensionMismatch {
                expected: system.num_variables(),
                actual: state.values.len(),
            });
        }
        if target_time < state.valid_at {
            return Err(OdeError::InvalidTimeRange {
                from: state.valid_at,
                to: target_time,
            });
        }

        let mut y = state.values.clone();
        system.apply_coupling(&mut y, coupling_input);
        self.solver
            .solve(system, &mut y, state.valid_at, target_time, self.dt)?;

        Ok(OdeState::new(y, target_time))
    }
}

impl Default for OdeStateIntegrator {
    fn default() -> Self {
        Self::new(&IntegratorConfig::default())
    }
}
