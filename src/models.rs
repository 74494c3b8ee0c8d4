//! # Export Data Model
//!
//! Hosts and metrics as listed by the monitoring server, the time window a
//! run covers, and the history samples fetched for each metric.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::utils::serde::deserialize_string_or_number;

/// A monitored host
///
/// `name` is the visible name and must be unique within a run: it becomes the
/// per-host directory name after sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    #[serde(rename = "hostid", deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    pub name: String,
    /// Technical host name (`host` in the API)
    #[serde(rename = "host", default)]
    pub technical_name: String,
}

impl Host {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            technical_name: name.clone(),
            name,
        }
    }
}

/// History storage a metric is kept in (`value_type` in the API)
///
/// Only the numeric kinds are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    /// `value_type = 0`
    Float,
    /// `value_type = 3`
    Unsigned,
}

impl HistoryKind {
    pub const NUMERIC: [HistoryKind; 2] = [HistoryKind::Float, HistoryKind::Unsigned];

    pub fn api_value(self) -> u8 {
        match self {
            HistoryKind::Float => 0,
            HistoryKind::Unsigned => 3,
        }
    }

    pub fn from_api_value(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(HistoryKind::Float),
            "3" => Some(HistoryKind::Unsigned),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::Float => write!(f, "float"),
            HistoryKind::Unsigned => write!(f, "unsigned"),
        }
    }
}

impl Serialize for HistoryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.api_value())
    }
}

impl<'de> Deserialize<'de> for HistoryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let raw = deserialize_string_or_number(deserializer)?;
        HistoryKind::from_api_value(&raw)
            .ok_or_else(|| D::Error::custom(format!("Unsupported value_type: {raw}")))
    }
}

/// A numeric item on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "itemid", deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "value_type")]
    pub kind: HistoryKind,
}

impl Metric {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: HistoryKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// The inclusive span of history exported by a run
///
/// Identical for every host and metric in a run. `label` names the run
/// directory and the archive (`20240315`, `202402`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    label: String,
}

impl TimeWindow {
    /// Returns `None` when `start` is after `end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, label: impl Into<String>) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            start,
            end,
            label: label.into(),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// One sample of a metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub metric_id: String,
    /// Whole-second timestamp (`clock`)
    pub clock: DateTime<Utc>,
    /// Sample value exactly as the server rendered it
    pub value: String,
    /// Nanosecond part of the timestamp
    pub ns: u32,
}
