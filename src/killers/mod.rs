//! Cell killers.
//!
//! A killer inspects the population after the lifecycle pass and marks
//! cells for death. Marked cells are removed from the population once every
//! killer has run.
//!
//! Provided:
//! - [`T2SwapCellKiller`]: removes degenerate triangular cells (vertex-based)
//! - [`RandomCellKiller`]: kills with a fixed probability per hour
//! - [`PlaneBasedCellKiller`]: kills cells whose centre lies beyond a plane

mod plane;
mod random;
mod t2_swap;

pub use plane::PlaneBasedCellKiller;
pub use random::RandomCellKiller;
pub use t2_swap::{SkipReason, SkippedCandidate, T2SwapCellKiller, T2SwapReport};

use crate::cell::CellId;
use crate::population::{CellPopulation, TopologyError};
use crate::simulation::SimulationContext;

/// Decides which cells die this step.
pub trait CellKiller: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Mark cells for death (or remove them directly) and return their ids.
    fn check_and_kill(
        &mut self,
        population: &mut CellPopulation,
        context: &mut SimulationContext,
    ) -> Result<Vec<CellId>, TopologyError>;
}
