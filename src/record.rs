use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Document body handed to the search engine for a single record.
pub type Document = serde_json::Value;

/// A single log event as produced by the logging front-end.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Time the record was captured. Only used for the document body.
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Build a record stamped with the current time and no metadata.
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level: level.into(),
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach one metadata entry, replacing any previous value for `key`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
