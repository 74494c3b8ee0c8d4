//! # Export Pipeline
//!
//! Turns hosts into directories of CSV tables:
//!
//! - [`orchestrator`]: bounded fan-out of host jobs and outcome aggregation
//! - [`host_exporter`]: per-host metric enumeration, fetch and write
//! - [`table`], [`clock`], [`sanitize`]: output formatting helpers
//! - [`outcome`]: per-host results and the run summary

pub mod clock;
pub mod host_exporter;
pub mod orchestrator;
pub mod outcome;
pub mod sanitize;
pub mod table;

pub use clock::ClockFormatter;
pub use host_exporter::HostExporter;
pub use orchestrator::ExportOrchestrator;
pub use outcome::{ExportOutcome, ExportSummary, HostExportReport};
pub use sanitize::sanitize_file_name;
