#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Zabbix History Export
//!
//! Exports numeric item history from a Zabbix server into per-host CSV
//! tables and packs each run into a zip archive.
//!
//! ## Overview
//!
//! A run covers one time window (today, yesterday, this month or last
//! month). Every host is exported independently: a host whose metrics cannot
//! be listed fails on its own, and a metric whose history cannot be fetched
//! is skipped without failing its host. Every remote call is retried once.
//!
//! ## Module Organization
//!
//! - [`client`] - `HistorySource` trait and the Zabbix JSON-RPC client
//! - [`resilience`] - single-retry executor for remote calls
//! - [`export`] - host exporter, bounded orchestrator and CSV output
//! - [`archive`] - zip packaging of a run directory
//! - [`runner`] - end-to-end run driver
//! - [`window`] - period to time-window resolution
//! - [`config`] - layered configuration
//! - [`error`] - error taxonomy and stable error codes
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zabbix_export::client::ZabbixClientFactory;
//! use zabbix_export::config::ExporterConfig;
//! use zabbix_export::runner::{ExportRunner, RunRequest};
//! use zabbix_export::window::PeriodKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExporterConfig::load()?;
//! let factory = ZabbixClientFactory::new(config.server.clone());
//! let runner = ExportRunner::new(config, factory)?;
//!
//! let report = runner
//!     .run(&RunRequest {
//!         period: PeriodKind::Yesterday,
//!         ..RunRequest::default()
//!     })
//!     .await?;
//! println!("{} hosts exported", report.summary.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod runner;
pub mod utils;
pub mod window;

pub use client::{HistorySource, HistorySourceFactory, ZabbixClient, ZabbixClientFactory};
pub use config::ExporterConfig;
pub use error::{ExportError, ExportResult, HostExportError, SourceError};
pub use export::{ExportOrchestrator, ExportOutcome, ExportSummary, HostExporter};
pub use models::{HistoryKind, HistoryRecord, Host, Metric, TimeWindow};
pub use runner::{ExportRunner, RunReport, RunRequest};
pub use window::PeriodKind;
