//! JSON export of population snapshots and parameter sets.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use super::SimulationObserver;
use crate::config::SimulationParameters;
use crate::simulation::StepReport;
use crate::state::PopulationSnapshot;

const EXPORT_VERSION: &str = "1.0.0";

/// Full snapshot export structure
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    pub snapshot: &'a PopulationSnapshot,
}

/// Write `snapshot` to `path` as pretty JSON.
pub fn export_snapshot_json<P: AsRef<Path>>(snapshot: &PopulationSnapshot, path: P) -> Result<()> {
    let export = SnapshotExport {
        exported_at: Local::now().to_rfc3339(),
        version: EXPORT_VERSION,
        snapshot,
    };

    let file = std::fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &export)?;

    log::debug!("JSON snapshot exported: {}", path.as_ref().display());
    Ok(())
}

/// Dump the parameter set a run was started with to `dir/parameters.json`.
pub fn export_parameters_json<P: AsRef<Path>>(params: &SimulationParameters, dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join("parameters.json");

    let file = std::fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, params)?;

    log::info!("Parameters written: {}", path.display());
    Ok(path)
}

/// Observer writing one `snapshot_NNNNNN.json` every `interval` steps.
pub struct JsonSnapshotExporter {
    dir: PathBuf,
    interval: u64,
    written: Vec<PathBuf>,
}

impl JsonSnapshotExporter {
    pub fn new<P: AsRef<Path>>(dir: P, interval: u64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            interval: interval.max(1),
            written: Vec::new(),
        })
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        let path = self.dir.join(format!("snapshot_{:06}.json", snapshot.step));
        export_snapshot_json(snapshot, &path)?;
        self.written.push(path);
        Ok(())
    }
}

impl SimulationObserver for JsonSnapshotExporter {
    fn name(&self) -> &str {
        "JsonSnapshotExporter"
    }

    fn on_setup(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        self.write(snapshot)
    }

    fn on_step_end(&mut self, snapshot: &PopulationSnapshot, _report: &StepReport) -> Result<()> {
        if snapshot.step % self.interval == 0 {
            self.write(snapshot)?;
        }
        Ok(())
    }

    fn on_finish(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        if snapshot.step % self.interval != 0 {
            self.write(snapshot)?;
        }
        log::info!("Wrote {} JSON snapshots to {}", self.written.len(), self.dir.display());
        Ok(())
    }
}
