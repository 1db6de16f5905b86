//! Save and restore a running simulation.
//!
//! A checkpoint holds everything that evolves during a run: the clock, the
//! RNG state, the driver's counters and the full cell/node/element/ODE
//! graph. Force laws, boundary conditions, killers and observers are
//! configuration, not state; they are re-attached after restoring.
//!
//! Floats are written with round-trip precision, so a run resumed from a
//! checkpoint reproduces the original bit for bit.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::population::CellPopulation;
use crate::simulation::{SimulationContext, SimulationCounters};

pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub context: SimulationContext,
    pub counters: SimulationCounters,
    pub population: CellPopulation,
}

impl Checkpoint {
    pub fn new(context: SimulationContext, counters: SimulationCounters, population: CellPopulation) -> Self {
        Self {
            format_version: CHECKPOINT_FORMAT_VERSION,
            context,
            counters,
            population,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let checkpoint: Self = serde_json::from_str(json).context("malformed checkpoint")?;
        if checkpoint.format_version != CHECKPOINT_FORMAT_VERSION {
            bail!(
                "unsupported checkpoint version {} (expected {})",
                checkpoint.format_version,
                CHECKPOINT_FORMAT_VERSION
            );
        }
        checkpoint
            .population
            .check_invariants()
            .context("checkpoint population is inconsistent")?;
        Ok(checkpoint)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot create checkpoint {}", path.display()))?;
        serde_json::to_writer(file, self)?;
        log::info!("Checkpoint saved: {} (step {})", path.display(), self.context.clock.step_count);
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read checkpoint {}", path.display()))?;
        let checkpoint = Self::from_json(&json)?;
        log::info!("Checkpoint loaded: {} (step {})", path.display(), checkpoint.context.clock.step_count);
        Ok(checkpoint)
    }
}
