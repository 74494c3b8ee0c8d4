//! Per-host results and their aggregate.

use std::path::PathBuf;

use crate::error::{HostExportError, MetricFetchFailure};
use crate::models::Host;

/// What a successful host export produced
#[derive(Debug, Default)]
pub struct HostExportReport {
    /// `<root>/<sanitized host name>`
    pub host_dir: PathBuf,
    /// One table per exported metric, in metric order
    pub files_written: Vec<PathBuf>,
    /// Metrics whose history fetch failed twice and were left out
    pub skipped_metrics: Vec<MetricFetchFailure>,
}

impl HostExportReport {
    pub fn new(host_dir: impl Into<PathBuf>) -> Self {
        Self {
            host_dir: host_dir.into(),
            ..Self::default()
        }
    }

    /// True when at least one metric was skipped
    pub fn is_partial(&self) -> bool {
        !self.skipped_metrics.is_empty()
    }
}

/// Result of exporting one host, produced exactly once per host
#[derive(Debug)]
pub struct ExportOutcome {
    pub host: Host,
    pub result: Result<HostExportReport, HostExportError>,
}

impl ExportOutcome {
    pub fn failed(host: Host, error: HostExportError) -> Self {
        Self {
            host,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn report(&self) -> Option<&HostExportReport> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&HostExportError> {
        self.result.as_ref().err()
    }

    /// Tables written for this host; empty when the export failed
    pub fn files_written(&self) -> &[PathBuf] {
        self.report()
            .map(|report| report.files_written.as_slice())
            .unwrap_or_default()
    }
}

/// All outcomes of a run, in completion order
#[derive(Debug, Default)]
pub struct ExportSummary {
    outcomes: Vec<ExportOutcome>,
}

impl ExportSummary {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, outcome: ExportOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ExportOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Total tables written across all hosts
    pub fn files_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.files_written().len()).sum()
    }

    /// Outcome for the host with this display name
    pub fn outcome_for(&self, host_name: &str) -> Option<&ExportOutcome> {
        self.outcomes.iter().find(|o| o.host.name == host_name)
    }
}

impl FromIterator<ExportOutcome> for ExportSummary {
    fn from_iter<I: IntoIterator<Item = ExportOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(name: &str, files: &[&str]) -> ExportOutcome {
        let mut report = HostExportReport::new(format!("/tmp/{name}"));
        report.files_written = files.iter().map(PathBuf::from).collect();
        ExportOutcome {
            host: Host::new("1", name),
            result: Ok(report),
        }
    }

    fn failure(name: &str) -> ExportOutcome {
        ExportOutcome::failed(
            Host::new("2", name),
            HostExportError::WorkerAborted {
                host: name.to_string(),
                reason: "boom".to_string(),
            },
        )
    }

    #[test]
    fn test_summary_counts() {
        let summary: ExportSummary = vec![
            success("srv-a", &["a.csv", "b.csv"]),
            failure("srv-b"),
            success("srv-c", &[]),
        ]
        .into_iter()
        .collect();

        assert_eq!(summary.len(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.files_written(), 2);
    }

    #[test]
    fn test_failed_outcome_has_no_files() {
        let outcome = failure("srv-b");
        assert!(!outcome.is_success());
        assert!(outcome.files_written().is_empty());
        assert!(outcome.error().is_some());
    }

    #[test]
    fn test_outcome_lookup_by_name() {
        let summary: ExportSummary = vec![success("srv-a", &[]), failure("srv-b")]
            .into_iter()
            .collect();
        assert!(summary.outcome_for("srv-b").is_some_and(|o| !o.is_success()));
        assert!(summary.outcome_for("srv-z").is_none());
    }
}
