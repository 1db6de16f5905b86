//! Output observer contract.

use anyhow::Result;

use crate::simulation::StepReport;
use crate::state::PopulationSnapshot;

/// Receives read-only snapshots while a simulation runs.
///
/// Errors returned here abort the run.
pub trait SimulationObserver {
    fn name(&self) -> &str;

    /// Called once before the first step.
    fn on_setup(&mut self, _snapshot: &PopulationSnapshot) -> Result<()> {
        Ok(())
    }

    /// Called after every completed step.
    fn on_step_end(&mut self, snapshot: &PopulationSnapshot, report: &StepReport) -> Result<()>;

    /// Called once when the run ends, normally or not.
    fn on_finish(&mut self, _snapshot: &PopulationSnapshot) -> Result<()> {
        Ok(())
    }
}
