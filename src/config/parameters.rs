//! Parameter structures.
//!
//! Every section has defaults matching the reference crypt and vertex
//! models, so a missing or partial JSON file still yields a runnable setup.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biochemistry::{DeltaNotchParameters, IntegratorConfig};
use crate::cell::{CellCycleParameters, G1DurationModel};
use crate::physics::{NagaiHondaParameters, SpringParameters};

/// A parameter set that cannot drive a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid parameter {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive and finite, got {}", value)))
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative and finite, got {}", value)))
    }
}

/// Load a JSON section from `path`, falling back to defaults.
fn load_section<T, P>(path: P, label: &str) -> T
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Top-level parameters container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub time: TimeParameters,
    /// Seed of the simulation's random stream
    pub seed: u64,
    pub mechanics: MechanicsParameters,
    pub vertex: VertexParameters,
    pub cell_cycle: CellCycleParameters,
    pub ode: OdeParameters,
    pub output: OutputParameters,
}

impl SimulationParameters {
    /// Load all sections from a single JSON file, or use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_section(path, "simulation")
    }

    /// Load one file per section from `dir` (`time.json`, `mechanics.json`,
    /// `vertex.json`, `cell_cycle.json`, `ode.json`, `output.json`).
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            time: load_section(dir.join("time.json"), "time"),
            seed: 0,
            mechanics: load_section(dir.join("mechanics.json"), "mechanics"),
            vertex: load_section(dir.join("vertex.json"), "vertex"),
            cell_cycle: load_section(dir.join("cell_cycle.json"), "cell cycle"),
            ode: load_section(dir.join("ode.json"), "ODE"),
            output: load_section(dir.join("output.json"), "output"),
        }
    }

    /// Check that the parameters describe a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.time;
        require_positive("time.dt", t.dt)?;
        if !(t.end_time >= t.start_time) {
            return Err(invalid(
                "time.end_time",
                format!("{} is before start time {}", t.end_time, t.start_time),
            ));
        }

        let m = &self.mechanics;
        require_positive("mechanics.damping_constant", m.damping_constant)?;
        require_positive("mechanics.max_displacement", m.max_displacement)?;
        require_positive("mechanics.cell_radius", m.cell_radius)?;
        require_positive("mechanics.spring.rest_length", m.spring.rest_length)?;
        require_positive("mechanics.spring.cutoff", m.spring.cutoff)?;
        require_positive("mechanics.spring.division_separation", m.spring.division_separation)?;
        require_non_negative("mechanics.spring.growth_duration", m.spring.growth_duration)?;
        require_non_negative("mechanics.nagai_honda.growth_duration", m.nagai_honda.growth_duration)?;

        if !self.vertex.t2_threshold.is_finite() {
            return Err(invalid("vertex.t2_threshold", "must be finite"));
        }

        let c = &self.cell_cycle;
        require_non_negative("cell_cycle.m_duration", c.m_duration)?;
        require_non_negative("cell_cycle.s_duration", c.s_duration)?;
        require_non_negative("cell_cycle.g2_duration", c.g2_duration)?;
        require_non_negative("cell_cycle.stem_g1_duration", c.stem_g1_duration)?;
        require_non_negative("cell_cycle.transit_g1_duration", c.transit_g1_duration)?;
        match c.g1_model {
            G1DurationModel::Fixed => {}
            G1DurationModel::Uniform { min, max } => {
                require_non_negative("cell_cycle.g1_model.min", min)?;
                if !(max >= min) {
                    return Err(invalid("cell_cycle.g1_model.max", format!("{} is below min {}", max, min)));
                }
            }
            G1DurationModel::Normal { sd } => require_non_negative("cell_cycle.g1_model.sd", sd)?,
        }

        require_positive("ode.integrator.dt", self.ode.integrator.dt)?;
        if self.output.interval == 0 {
            return Err(invalid("output.interval", "must be at least one step"));
        }
        Ok(())
    }
}

/// Simulated time span, in hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeParameters {
    pub start_time: f64,
    pub end_time: f64,
    pub dt: f64,
}

impl Default for TimeParameters {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 10.0,
            dt: 0.005,
        }
    }
}

/// Mechanics: force laws, damping and update limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanicsParameters {
    /// Viscous drag η in x += dt F / η
    pub damping_constant: f64,
    /// Per-step displacement clamp
    pub max_displacement: f64,
    /// Disc radius reported as the area of centre-based cells
    pub cell_radius: f64,
    pub spring: SpringParameters,
    pub nagai_honda: NagaiHondaParameters,
}

impl Default for MechanicsParameters {
    fn default() -> Self {
        Self {
            damping_constant: 1.0,
            max_displacement: 0.5,
            cell_radius: 0.5,
            spring: SpringParameters::default(),
            nagai_honda: NagaiHondaParameters::default(),
        }
    }
}

/// Vertex mesh maintenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexParameters {
    /// Area at or below which a triangular cell is removed; 0 disables
    pub t2_threshold: f64,
}

impl Default for VertexParameters {
    fn default() -> Self {
        Self { t2_threshold: 0.001 }
    }
}

/// Sub-cellular ODEs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdeParameters {
    pub integrator: IntegratorConfig,
    pub delta_notch: DeltaNotchParameters,
}

/// Output observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputParameters {
    pub directory: String,
    /// Write every `interval` steps
    pub interval: u64,
    /// Include per-node velocities in JSON snapshots
    pub node_velocities: bool,
}

impl Default for OutputParameters {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            interval: 100,
            node_velocities: false,
        }
    }
}
