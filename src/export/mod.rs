//! Export functionality for simulation data.
//!
//! Provides the observer contract, CSV time-series export and JSON snapshot
//! export.

mod csv_export;
mod json_export;
mod observer;

pub use csv_export::{CsvExporter, TimeSeriesRecord};
pub use json_export::{export_parameters_json, export_snapshot_json, JsonSnapshotExporter, SnapshotExport};
pub use observer::SimulationObserver;
