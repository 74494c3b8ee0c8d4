//! # Host Exporter
//!
//! Materializes one host's export: a directory named after the host holding
//! one CSV table per numeric metric. Metrics are processed sequentially in
//! the order the source returns them.
//!
//! Failure scopes inside a host:
//!
//! - directory creation or metric listing fails: the host is aborted
//! - one metric's history cannot be fetched: that metric is skipped
//! - a table cannot be written: the host is aborted, earlier tables stay

use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::HistorySource;
use crate::error::{HostExportError, MetricFetchFailure};
use crate::export::clock::ClockFormatter;
use crate::export::outcome::{ExportOutcome, HostExportReport};
use crate::export::sanitize::sanitize_file_name;
use crate::export::table::{write_table, TABLE_EXTENSION};
use crate::models::{Host, Metric, TimeWindow};
use crate::resilience::RetryingExecutor;

/// Exports one host at a time; cheap to clone and share between workers
#[derive(Debug, Clone)]
pub struct HostExporter {
    clock: ClockFormatter,
    retry: RetryingExecutor,
    metric_filter: Option<String>,
}

impl HostExporter {
    pub fn new(clock: ClockFormatter) -> Self {
        Self {
            clock,
            retry: RetryingExecutor::new("host_exporter"),
            metric_filter: None,
        }
    }

    /// Only export metrics whose display name equals `name`
    pub fn with_metric_filter(mut self, name: Option<String>) -> Self {
        self.metric_filter = name;
        self
    }

    /// Directory a host's tables are written to
    pub fn host_dir(root: &Path, host: &Host) -> PathBuf {
        root.join(sanitize_file_name(&host.name))
    }

    /// Table path for one metric inside a host directory
    pub fn table_path(host_dir: &Path, metric: &Metric) -> PathBuf {
        host_dir.join(format!(
            "{}.{TABLE_EXTENSION}",
            sanitize_file_name(&metric.name)
        ))
    }

    /// Export `host` into `root`, never panicking on remote or disk errors
    pub async fn export<S>(
        &self,
        source: &S,
        host: &Host,
        window: &TimeWindow,
        root: &Path,
    ) -> ExportOutcome
    where
        S: HistorySource + ?Sized,
    {
        let started = Instant::now();
        info!(host = %host.name, hostid = %host.id, "Host export started");

        let result = self.export_host(source, host, window, root).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(report) => info!(
                host = %host.name,
                files = report.files_written.len(),
                skipped = report.skipped_metrics.len(),
                elapsed_ms = elapsed_ms,
                "Host export finished"
            ),
            Err(e) => error!(
                host = %host.name,
                error_code = e.code(),
                error = %e,
                elapsed_ms = elapsed_ms,
                "Host export aborted"
            ),
        }

        ExportOutcome {
            host: host.clone(),
            result,
        }
    }

    async fn export_host<S>(
        &self,
        source: &S,
        host: &Host,
        window: &TimeWindow,
        root: &Path,
    ) -> Result<HostExportReport, HostExportError>
    where
        S: HistorySource + ?Sized,
    {
        let host_dir = Self::host_dir(root, host);
        tokio::fs::create_dir_all(&host_dir)
            .await
            .map_err(|source| HostExportError::CreateDirectory {
                path: host_dir.clone(),
                source,
            })?;

        let host_id = host.id.as_str();
        let metrics = self
            .retry
            .call(&format!("item.get hostid={host_id}"), move || {
                source.list_metrics(host_id)
            })
            .await
            .map_err(|source| HostExportError::ListMetrics {
                host: host.name.clone(),
                source,
            })?;

        let metrics = self.apply_filter(host, metrics);
        debug!(host = %host.name, metrics = metrics.len(), "Metrics to export");

        let mut report = HostExportReport::new(host_dir.clone());
        for metric in &metrics {
            let metric_id = metric.id.as_str();
            let kind = metric.kind;
            let fetched = self
                .retry
                .call(&format!("history.get itemid={metric_id}"), move || {
                    source.fetch_history(host_id, metric_id, kind, window)
                })
                .await;

            let records = match fetched {
                Ok(records) => records,
                Err(source) => {
                    let failure = MetricFetchFailure {
                        metric: metric.name.clone(),
                        metric_id: metric.id.clone(),
                        source,
                    };
                    error!(
                        host = %host.name,
                        metric = %metric.name,
                        error_code = failure.code(),
                        error = %failure.source,
                        "History fetch failed, skipping metric"
                    );
                    report.skipped_metrics.push(failure);
                    continue;
                }
            };

            let path = Self::table_path(&host_dir, metric);
            write_table(&path, &records, &self.clock)
                .await
                .map_err(|source| HostExportError::WriteTable {
                    metric: metric.name.clone(),
                    path: path.clone(),
                    source,
                })?;

            debug!(
                host = %host.name,
                metric = %metric.name,
                rows = records.len(),
                path = %path.display(),
                "History table written"
            );
            report.files_written.push(path);
        }

        Ok(report)
    }

    fn apply_filter(&self, host: &Host, metrics: Vec<Metric>) -> Vec<Metric> {
        let Some(wanted) = self.metric_filter.as_deref() else {
            return metrics;
        };

        let matched: Vec<Metric> = metrics.into_iter().filter(|m| m.name == wanted).collect();
        if matched.is_empty() {
            warn!(host = %host.name, item = %wanted, "No metric matches the requested item name");
        }
        matched
    }
}
