//! Delta-Notch lateral inhibition.
//!
//! Each cell carries Notch (N) and Delta (D) levels plus the mean Delta of
//! its neighbours, which is held constant during integration and refreshed
//! from the population before every advance:
//!
//! dN/dt = D̄² / (a + D̄²) - N
//! dD/dt = 1 / (1 + b N²) - D
//! dD̄/dt = 0
//!
//! High neighbour Delta activates Notch, which in turn represses the cell's
//! own Delta, so neighbouring cells settle into alternating fates.
//!
//! Reference: Collier et al., J Theor Biol 1996

use serde::{Deserialize, Serialize};

use super::OdeSystem;

pub const NOTCH: usize = 0;
pub const DELTA: usize = 1;
pub const MEAN_DELTA: usize = 2;

const VARIABLE_NAMES: [&str; 3] = ["notch", "delta", "mean_delta"];

/// Parameters for Delta-Notch signalling (dimensionless)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaNotchParameters {
    /// Half-saturation constant of Notch activation (a)
    pub activation_constant: f64,
    /// Strength of Delta repression by Notch (b)
    pub repression_strength: f64,
    pub initial_notch: f64,
    pub initial_delta: f64,
}

impl Default for DeltaNotchParameters {
    fn default() -> Self {
        Self {
            activation_constant: 0.01,
            repression_strength: 100.0,
            initial_notch: 1.0,
            initial_delta: 1.0,
        }
    }
}

/// Delta-Notch ODE system.
#[derive(Debug, Clone, Default)]
pub struct DeltaNotchOdeSystem {
    pub params: DeltaNotchParameters,
}

impl DeltaNotchOdeSystem {
    pub fn new(params: DeltaNotchParameters) -> Self {
        Self { params }
    }
}

impl OdeSystem for DeltaNotchOdeSystem {
    fn name(&self) -> &str {
        "delta_notch"
    }

    fn num_variables(&self) -> usize {
        VARIABLE_NAMES.len()
    }

    fn variable_names(&self) -> &[&'static str] {
        &VARIABLE_NAMES
    }

    fn initial_conditions(&self) -> Vec<f64> {
        vec![self.params.initial_notch, self.params.initial_delta, 0.0]
    }

    fn evaluate(&self, _time: f64, y: &[f64], dydt: &mut [f64]) {
        let notch = y[NOTCH];
        let delta = y[DELTA];
        let mean_delta = y[MEAN_DELTA];
        let a = self.params.activation_constant;
        let b = self.params.repression_strength;

        let md2 = mean_delta * mean_delta;
        dydt[NOTCH] = md2 / (a + md2) - notch;
        dydt[DELTA] = 1.0 / (1.0 + b * notch * notch) - delta;
        dydt[MEAN_DELTA] = 0.0;
    }

    fn apply_coupling(&self, y: &mut [f64], input: f64) {
        y[MEAN_DELTA] = input;
    }

    fn coupling_output(&self, y: &[f64]) -> Option<f64> {
        y.get(DELTA).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biochemistry::{IntegratorConfig, OdeState, OdeStateIntegrator};
    use approx::assert_relative_eq;

    #[test]
    fn test_derivatives_at_initial_state() {
        let system = DeltaNotchOdeSystem::default();
        let y = [1.0, 1.0, 0.5];
        let mut dydt = [0.0; 3];
        system.evaluate(0.0, &y, &mut dydt);

        // 0.25 / 0.26 - 1 and 1/101 - 1
        assert_relative_eq!(dydt[NOTCH], 0.25 / 0.26 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(dydt[DELTA], 1.0 / 101.0 - 1.0, epsilon = 1e-12);
        assert_eq!(dydt[MEAN_DELTA], 0.0);
    }

    #[test]
    fn test_isolated_cell_loses_notch() {
        // Without neighbour Delta, Notch decays and Delta recovers towards 1
        let system = DeltaNotchOdeSystem::default();
        let mut integrator = OdeStateIntegrator::new(&IntegratorConfig::default());
        let state = OdeState::initial(&system, 0.0);

        let end = integrator.advance(&system, &state, 10.0, 0.0).unwrap();
        assert!(end.values[NOTCH] < 1e-3, "notch = {}", end.values[NOTCH]);
        assert_relative_eq!(end.values[DELTA], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_coupling_sets_mean_delta() {
        let system = DeltaNotchOdeSystem::default();
        let mut integrator = OdeStateIntegrator::default();
        let state = OdeState::initial(&system, 0.0);

        let next = integrator.advance(&system, &state, 0.1, 0.8).unwrap();
        assert_eq!(next.values[MEAN_DELTA], 0.8);
        assert_eq!(system.coupling_output(&next.values), Some(next.values[DELTA]));
    }

    #[test]
    fn test_variable_lookup() {
        let system = DeltaNotchOdeSystem::default();
        assert_eq!(system.variable_index("delta"), Some(DELTA));
        assert_eq!(system.variable_index("oxygen"), None);
    }
}
