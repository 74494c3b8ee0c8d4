//! # Export Orchestrator
//!
//! Fans hosts out across a bounded pool of tokio tasks. Each task waits for a
//! semaphore permit, builds its own data source through the factory, runs the
//! [`HostExporter`] and reports its [`ExportOutcome`] over an mpsc channel.
//! The orchestrator logs outcomes as they arrive and never stops early
//! because a host failed.
//!
//! Every host yields exactly one outcome. A task that panics never reaches
//! the channel; its join handle surfaces the panic and the orchestrator
//! records [`HostExportError::WorkerAborted`] for that host instead.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::HistorySourceFactory;
use crate::error::{codes, HostExportError};
use crate::export::host_exporter::HostExporter;
use crate::export::outcome::{ExportOutcome, ExportSummary};
use crate::models::{Host, TimeWindow};

/// Runs host exports with at most `worker_count` hosts in flight
#[derive(Debug)]
pub struct ExportOrchestrator<F: HistorySourceFactory> {
    factory: Arc<F>,
    exporter: Arc<HostExporter>,
    worker_count: usize,
}

impl<F: HistorySourceFactory> ExportOrchestrator<F> {
    /// `worker_count` below one is raised to one
    pub fn new(factory: Arc<F>, exporter: HostExporter, worker_count: usize) -> Self {
        Self {
            factory,
            exporter: Arc::new(exporter),
            worker_count: worker_count.max(1),
        }
    }

    /// Export every host in `hosts` under `root`
    pub async fn export_all(&self, hosts: Vec<Host>, window: &TimeWindow, root: &Path) -> ExportSummary {
        let total = hosts.len();
        info!(
            hosts = total,
            workers = self.worker_count,
            window = %window.label(),
            "Pooled export starting"
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let (outcome_sender, mut outcome_receiver) = mpsc::channel::<ExportOutcome>(total.max(1));
        let window = Arc::new(window.clone());
        let root: Arc<PathBuf> = Arc::new(root.to_path_buf());

        let mut workers: Vec<(Host, JoinHandle<()>)> = Vec::with_capacity(total);
        for host in hosts {
            let factory = self.factory.clone();
            let exporter = self.exporter.clone();
            let semaphore = semaphore.clone();
            let sender = outcome_sender.clone();
            let window = window.clone();
            let root = root.clone();
            let task_host = host.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is local to this call and never closed
                let permit = semaphore.acquire_owned().await.ok();
                debug!(host = %task_host.name, "Acquired worker permit");
                let outcome =
                    export_with_fresh_source(&*factory, &exporter, &task_host, &window, &root).await;
                drop(permit);

                if let Err(e) = sender.send(outcome).await {
                    error!(
                        host = %task_host.name,
                        error = %e,
                        "Failed to report host outcome - channel closed"
                    );
                }
            });
            workers.push((host, handle));
        }
        drop(outcome_sender);

        let mut summary = ExportSummary::with_capacity(total);
        while let Some(outcome) = outcome_receiver.recv().await {
            log_outcome(&outcome, summary.len() + 1, total);
            summary.push(outcome);
        }

        // Senders are all gone, so every worker has finished or died
        for (host, handle) in workers {
            if let Err(join_error) = handle.await {
                let reason = if join_error.is_panic() {
                    "worker panicked".to_string()
                } else {
                    join_error.to_string()
                };
                let outcome = ExportOutcome::failed(
                    host.clone(),
                    HostExportError::WorkerAborted {
                        host: host.name.clone(),
                        reason,
                    },
                );
                log_outcome(&outcome, summary.len() + 1, total);
                summary.push(outcome);
            }
        }

        info!(
            hosts = total,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            files = summary.files_written(),
            "Pooled export finished"
        );
        summary
    }

    /// Export the host whose display name is `name`, inline on this task
    ///
    /// Returns `None` when no listed host carries that name. The miss is
    /// logged with code `0007` and is not an error for the run.
    pub async fn export_named(
        &self,
        hosts: &[Host],
        name: &str,
        window: &TimeWindow,
        root: &Path,
    ) -> Option<ExportOutcome> {
        let Some(host) = hosts.iter().find(|h| h.name == name) else {
            error!(
                host = %name,
                error_code = codes::HOST_NOT_REGISTERED,
                "Host is not registered on the monitoring server"
            );
            return None;
        };

        info!(host = %host.name, window = %window.label(), "Single-host export starting");
        let outcome =
            export_with_fresh_source(&*self.factory, &self.exporter, host, window, root).await;
        log_outcome(&outcome, 1, 1);
        Some(outcome)
    }
}

async fn export_with_fresh_source<F: HistorySourceFactory>(
    factory: &F,
    exporter: &HostExporter,
    host: &Host,
    window: &TimeWindow,
    root: &Path,
) -> ExportOutcome {
    match factory.create() {
        Ok(source) => exporter.export(&source, host, window, root).await,
        Err(e) => {
            let error = HostExportError::Connect(e);
            error!(
                host = %host.name,
                error_code = error.code(),
                error = %error,
                "Cannot create data source for host"
            );
            ExportOutcome::failed(host.clone(), error)
        }
    }
}

fn log_outcome(outcome: &ExportOutcome, completed: usize, total: usize) {
    match &outcome.result {
        Ok(report) if report.is_partial() => warn!(
            host = %outcome.host.name,
            completed = completed,
            total = total,
            files = report.files_written.len(),
            skipped = report.skipped_metrics.len(),
            "⚠️ Host exported with skipped metrics"
        ),
        Ok(report) => info!(
            host = %outcome.host.name,
            completed = completed,
            total = total,
            files = report.files_written.len(),
            "✅ Host exported"
        ),
        Err(e) => error!(
            host = %outcome.host.name,
            completed = completed,
            total = total,
            error_code = e.code(),
            error = %e,
            "❌ Host export failed"
        ),
    }
}
