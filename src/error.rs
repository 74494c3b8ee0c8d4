//! Error types for the export pipeline.
//!
//! Failures are split by how far they reach:
//!
//! - [`SourceError`]: a single remote call failed. The retry executor absorbs
//!   the first one; a second consecutive failure surfaces to the call site.
//! - [`MetricFetchFailure`]: one metric's history could not be fetched. The
//!   metric is skipped and the host carries on.
//! - [`HostExportError`]: the host's export is aborted. Other hosts are not
//!   affected.
//! - [`ExportError`]: the whole run is aborted.
//!
//! Every error exposes a stable four-digit code through `code()` so log lines
//! can be grepped across runs.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigurationError;

/// Stable identifiers attached to log lines as `error_code`.
pub mod codes {
    pub const REQUEST_FAILED: &str = "0001";
    pub const DIRECTORY_CREATE_FAILED: &str = "0002";
    pub const TABLE_WRITE_FAILED: &str = "0003";
    pub const INVALID_ARGUMENT: &str = "0005";
    pub const HOST_LIST_FAILED: &str = "0006";
    pub const HOST_NOT_REGISTERED: &str = "0007";
    pub const ARCHIVE_FAILED: &str = "0008";
    pub const UNKNOWN: &str = "9999";
}

pub type SourceResult<T> = Result<T, SourceError>;
pub type ExportResult<T> = Result<T, ExportError>;

/// A remote call against the monitoring server failed
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message} {data}")]
    Api {
        code: i64,
        message: String,
        data: String,
    },

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl SourceError {
    /// Create an API error from a JSON-RPC error object
    pub fn api(code: i64, message: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
            data: data.into(),
        }
    }

    /// Create an invalid response error for protocol violations
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        codes::REQUEST_FAILED
    }
}

/// Failure while serializing one metric's history table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One metric's history could not be fetched; the metric was skipped
#[derive(Debug, Error)]
#[error("history fetch failed for metric '{metric}' (itemid {metric_id}): {source}")]
pub struct MetricFetchFailure {
    pub metric: String,
    pub metric_id: String,
    #[source]
    pub source: SourceError,
}

impl MetricFetchFailure {
    pub fn code(&self) -> &'static str {
        self.source.code()
    }
}

/// The export of a single host was aborted
#[derive(Debug, Error)]
pub enum HostExportError {
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build data source client: {0}")]
    Connect(#[source] SourceError),

    #[error("cannot list metrics for host '{host}': {source}")]
    ListMetrics {
        host: String,
        #[source]
        source: SourceError,
    },

    #[error("cannot write history table for '{metric}' to {}: {source}", path.display())]
    WriteTable {
        metric: String,
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("export worker for host '{host}' terminated abnormally: {reason}")]
    WorkerAborted { host: String, reason: String },
}

impl HostExportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::CreateDirectory { .. } => codes::DIRECTORY_CREATE_FAILED,
            Self::Connect(e) => e.code(),
            Self::ListMetrics { source, .. } => source.code(),
            Self::WriteTable { .. } => codes::TABLE_WRITE_FAILED,
            Self::WorkerAborted { .. } => codes::UNKNOWN,
        }
    }
}

/// Failure while packaging the export directory
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("source directory {} does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("archive task failed: {0}")]
    Join(String),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The run as a whole failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot list hosts from the monitoring server: {0}")]
    HostList(#[source] SourceError),

    #[error("cannot create export directory {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot archive export directory: {0}")]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::HostList(_) => codes::HOST_LIST_FAILED,
            Self::OutputRoot { .. } => codes::DIRECTORY_CREATE_FAILED,
            Self::Archive(_) => codes::ARCHIVE_FAILED,
            Self::InvalidArgument(_) => codes::INVALID_ARGUMENT,
            Self::Configuration(_) | Self::Logging(_) => codes::UNKNOWN,
        }
    }
}
