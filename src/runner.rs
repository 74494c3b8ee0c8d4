//! # Run Driver
//!
//! Ties one export run together:
//!
//! 1. resolve the time window for the requested period
//! 2. list hosts through the retry executor (run-fatal on failure)
//! 3. create `<export_dir>/<label>` (run-fatal on failure)
//! 4. export one named host inline, or all hosts through the pool
//! 5. archive the run directory when archiving is enabled
//!
//! Host and metric failures are reported in the [`RunReport`]; only the
//! steps above that are marked run-fatal turn into an [`ExportError`].

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::archive::{archive_stem, Archiver};
use crate::client::{HistorySource, HistorySourceFactory};
use crate::config::ExporterConfig;
use crate::error::{ExportError, ExportResult};
use crate::export::{ClockFormatter, ExportOrchestrator, ExportSummary, HostExporter};
use crate::models::TimeWindow;
use crate::resilience::RetryingExecutor;
use crate::window::PeriodKind;

/// Parameters of one run, usually taken from the command line
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub period: PeriodKind,
    /// Export only this host (display name)
    pub host: Option<String>,
    /// Export only metrics with this display name
    pub item: Option<String>,
}

/// What a completed run did
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub window: TimeWindow,
    pub summary: ExportSummary,
    /// A single host was requested but the server does not know it
    pub host_not_found: bool,
    /// Path of the zip, when archiving ran
    pub archive: Option<PathBuf>,
    /// Run directory, when it was kept on disk
    pub export_dir: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Executes runs against sources built by `F`
#[derive(Debug)]
pub struct ExportRunner<F: HistorySourceFactory> {
    config: ExporterConfig,
    factory: Arc<F>,
    clock: ClockFormatter,
    retry: RetryingExecutor,
}

impl<F: HistorySourceFactory> ExportRunner<F> {
    pub fn new(config: ExporterConfig, factory: F) -> ExportResult<Self> {
        config.validate()?;
        let offset = config.export.utc_offset()?;
        Ok(Self {
            config,
            factory: Arc::new(factory),
            clock: ClockFormatter::new(offset),
            retry: RetryingExecutor::new("runner"),
        })
    }

    /// Run with the window anchored at the current time
    pub async fn run(&self, request: &RunRequest) -> ExportResult<RunReport> {
        self.run_at(request, self.clock.now()).await
    }

    /// Run with the window anchored at `now`
    pub async fn run_at(
        &self,
        request: &RunRequest,
        now: DateTime<FixedOffset>,
    ) -> ExportResult<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("export_run", run_id = %run_id, period = %request.period);
        self.execute(run_id, request, now).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        request: &RunRequest,
        now: DateTime<FixedOffset>,
    ) -> ExportResult<RunReport> {
        let started = Instant::now();
        let window = request
            .period
            .resolve(now)
            .map_err(|e| ExportError::InvalidArgument(e.to_string()))?;

        info!(
            window = %window.label(),
            start = %window.start().with_timezone(&self.clock.offset()),
            end = %window.end().with_timezone(&self.clock.offset()),
            host = request.host.as_deref().unwrap_or("*"),
            item = request.item.as_deref().unwrap_or("*"),
            "Export run starting"
        );

        let hosts = {
            let source = self.factory.create().map_err(ExportError::HostList)?;
            let source = &source;
            self.retry
                .call("host.get", move || source.list_hosts())
                .await
                .map_err(ExportError::HostList)?
        };
        info!(hosts = hosts.len(), "Host list retrieved");

        let export_root = self.config.export.export_dir.clone();
        let run_dir = export_root.join(window.label());
        tokio::fs::create_dir_all(&run_dir)
            .await
            .map_err(|source| ExportError::OutputRoot {
                path: run_dir.clone(),
                source,
            })?;

        let exporter = HostExporter::new(self.clock).with_metric_filter(request.item.clone());
        let orchestrator = ExportOrchestrator::new(
            self.factory.clone(),
            exporter,
            self.config.export.worker_count,
        );

        let mut host_not_found = false;
        let summary = match request.host.as_deref() {
            Some(name) => {
                match orchestrator
                    .export_named(&hosts, name, &window, &run_dir)
                    .await
                {
                    Some(outcome) => std::iter::once(outcome).collect(),
                    None => {
                        host_not_found = true;
                        ExportSummary::default()
                    }
                }
            }
            None => orchestrator.export_all(hosts, &window, &run_dir).await,
        };

        let (archive, export_dir) = if self.config.archive.enabled {
            let stem = archive_stem(window.label(), request.host.as_deref());
            let path = Archiver::new(&export_root)
                .archive(window.label(), &stem)
                .await?;
            (Some(path), None)
        } else {
            info!(path = %run_dir.display(), "Archiving disabled, leaving export directory");
            (None, Some(run_dir))
        };

        let elapsed = started.elapsed();
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            files = summary.files_written(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Export run finished"
        );

        Ok(RunReport {
            run_id,
            window,
            summary,
            host_not_found,
            archive,
            export_dir,
            elapsed,
        })
    }
}
