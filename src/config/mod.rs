//! Configuration module for loading simulation parameters.
//!
//! Parameters are plain serde structs read from JSON, with defaults for
//! every field and a `validate` pass before a simulation is built.

mod parameters;

pub use parameters::{
    ConfigError, MechanicsParameters, OdeParameters, OutputParameters, SimulationParameters,
    TimeParameters, VertexParameters,
};
