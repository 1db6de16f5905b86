//! Cell population simulator - off-lattice tissue mechanics in 2D
//!
//! Cells are either points joined by springs (centre-based) or polygons
//! sharing vertices (vertex-based). Each cell runs a cell cycle and may carry
//! a sub-cellular ODE state, such as Delta-Notch signalling, that is coupled
//! to its neighbours. A fixed-order driver alternates mechanics, lifecycle
//! and mesh maintenance.

pub mod biochemistry;
pub mod cell;
pub mod config;
pub mod export;
pub mod geometry;
pub mod killers;
pub mod physics;
pub mod population;
pub mod simulation;
pub mod state;

pub use biochemistry::{DeltaNotchOdeSystem, OdeState, OdeStateIntegrator, OdeSystem};
pub use cell::{Cell, CellCycleModel, CellId};
pub use config::SimulationParameters;
pub use geometry::{HoneycombGenerator, VertexMesh};
pub use population::{CellPopulation, NodeBasedCellPopulation, VertexBasedCellPopulation};
pub use simulation::{Simulation, SimulationContext, SimulationStatus, StepReport};
pub use state::{Checkpoint, PopulationSnapshot};
