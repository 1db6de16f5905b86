//! Simulation state views and persistence.
//!
//! Contains the read-only snapshot handed to observers, the summary metrics
//! derived from it and the checkpoint format used to save and resume runs.

mod checkpoint;
mod metrics;
mod snapshot;

pub use checkpoint::{Checkpoint, CHECKPOINT_FORMAT_VERSION};
pub use metrics::PopulationMetrics;
pub use snapshot::{CellRecord, PopulationSnapshot};
