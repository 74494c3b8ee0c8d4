//! # Data Source Traits
//!
//! The export pipeline only talks to the monitoring server through these
//! traits, so tests can substitute an in-memory source.

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::models::{HistoryKind, HistoryRecord, Host, Metric, TimeWindow};

/// Read-only view of a monitoring server
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// All hosts, sorted by name
    async fn list_hosts(&self) -> SourceResult<Vec<Host>>;

    /// Numeric metrics of one host, sorted by name
    async fn list_metrics(&self, host_id: &str) -> SourceResult<Vec<Metric>>;

    /// History of one metric inside `window`, oldest sample first
    async fn fetch_history(
        &self,
        host_id: &str,
        metric_id: &str,
        kind: HistoryKind,
        window: &TimeWindow,
    ) -> SourceResult<Vec<HistoryRecord>>;
}

/// Builds a fresh [`HistorySource`] for each unit of work
///
/// Sources are short-lived values: every host export creates its own and
/// drops it when done. No connection or session state is shared between
/// workers.
pub trait HistorySourceFactory: Send + Sync + 'static {
    type Source: HistorySource + 'static;

    fn create(&self) -> SourceResult<Self::Source>;
}
