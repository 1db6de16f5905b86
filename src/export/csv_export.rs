//! CSV time-series export of population metrics.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use super::SimulationObserver;
use crate::simulation::StepReport;
use crate::state::{PopulationMetrics, PopulationSnapshot};

/// Record for CSV time-series export
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesRecord {
    pub step: u64,
    /// Simulation time (hours)
    pub time: f64,
    pub num_cells: usize,
    pub num_nodes: usize,
    pub mean_area: f64,
    pub stem_cells: usize,
    pub transit_cells: usize,
    pub differentiated_cells: usize,
    pub mitotic_cells: usize,
    /// Events since the previous record
    pub births: usize,
    pub deaths: usize,
    pub t2_swaps: usize,
    pub ode_failures: usize,
    pub mean_ode_0: Option<f64>,
    pub mean_ode_1: Option<f64>,
}

impl TimeSeriesRecord {
    fn new(metrics: &PopulationMetrics, events: &EventTally) -> Self {
        Self {
            step: metrics.step,
            time: metrics.time,
            num_cells: metrics.num_cells,
            num_nodes: metrics.num_nodes,
            mean_area: metrics.mean_area,
            stem_cells: metrics.stem_cells,
            transit_cells: metrics.transit_cells,
            differentiated_cells: metrics.differentiated_cells,
            mitotic_cells: metrics.mitotic_cells,
            births: events.births,
            deaths: events.deaths,
            t2_swaps: events.t2_swaps,
            ode_failures: events.ode_failures,
            mean_ode_0: metrics.mean_ode_0,
            mean_ode_1: metrics.mean_ode_1,
        }
    }
}

#[derive(Debug, Default)]
struct EventTally {
    births: usize,
    deaths: usize,
    t2_swaps: usize,
    ode_failures: usize,
}

/// CSV exporter for time-series data
pub struct CsvExporter {
    writer: csv::Writer<File>,
    /// Sample every `interval` steps
    interval: u64,
    events: EventTally,
    /// Path to output file
    path: PathBuf,
}

impl CsvExporter {
    /// Create a new CSV exporter writing into `dir`
    ///
    /// Creates the directory if it doesn't exist.
    /// Filename is auto-generated with timestamp.
    pub fn new<P: AsRef<Path>>(dir: P, interval: u64) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("timeseries_{}.csv", timestamp));
        Self::to_path(path, interval)
    }

    /// Create an exporter writing to exactly `path`.
    pub fn to_path<P: AsRef<Path>>(path: P, interval: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            interval: interval.max(1),
            events: EventTally::default(),
            path,
        })
    }

    /// Write one row and reset the event tally
    pub fn record(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        let metrics = PopulationMetrics::from(snapshot);
        self.writer.serialize(TimeSeriesRecord::new(&metrics, &self.events))?;
        self.events = EventTally::default();
        Ok(())
    }

    /// Get the output path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SimulationObserver for CsvExporter {
    fn name(&self) -> &str {
        "CsvExporter"
    }

    fn on_setup(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        self.record(snapshot)
    }

    fn on_step_end(&mut self, snapshot: &PopulationSnapshot, report: &StepReport) -> Result<()> {
        self.events.births += report.births.len();
        self.events.deaths += report.deaths.len();
        self.events.t2_swaps += report.t2_swaps.len();
        self.events.ode_failures += report.ode_failures.len();

        if snapshot.step % self.interval == 0 {
            self.record(snapshot)?;
        }
        Ok(())
    }

    fn on_finish(&mut self, snapshot: &PopulationSnapshot) -> Result<()> {
        if snapshot.step % self.interval != 0 {
            self.record(snapshot)?;
        }
        self.writer.flush()?;
        log::info!("CSV export completed: {}", self.path.display());
        Ok(())
    }
}
