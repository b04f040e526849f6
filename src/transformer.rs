use std::sync::Arc;

use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

use crate::record::{Document, LogRecord};

/// Pure mapping from a [`LogRecord`] to the document stored in the index.
///
/// Transformers run on the caller's thread for every record, must not do
/// I/O and must always return a document, even for odd input.
pub type Transformer = Arc<dyn Fn(&LogRecord) -> Document + Send + Sync>;

/// The transformer used when none is configured.
pub fn default_transformer() -> Transformer {
    Arc::new(logstash_document)
}

/// Logstash-like shape:
///
/// ```json
/// {
///   "@timestamp": "2026-10-18T09:30:00.000Z",
///   "message": "...",
///   "severity": "error",
///   "fields": { "user_id": 42 }
/// }
/// ```
///
/// Metadata keys are copied into `fields` unaltered.
pub fn logstash_document(record: &LogRecord) -> Document {
    let fields: Map<String, Value> = record
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    json!({
        "@timestamp": record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        "message": record.message,
        "severity": record.level,
        "fields": Value::Object(fields),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shape_keeps_level_and_metadata() {
        let record = LogRecord::new("error", "some message").with_field("someField", true);

        let doc = (default_transformer())(&record);

        assert!(doc.get("@timestamp").and_then(Value::as_str).is_some());
        assert_eq!(doc["severity"], "error");
        assert_eq!(doc["message"], "some message");
        assert_eq!(doc["fields"]["someField"], true);
    }

    #[test]
    fn nested_metadata_is_copied_verbatim() {
        let record = LogRecord::new("info", "")
            .with_field("request", json!({ "path": "/login", "status": 401 }))
            .with_field("tags", json!(["auth", "web"]));

        let doc = logstash_document(&record);

        assert_eq!(doc["fields"]["request"]["status"], 401);
        assert_eq!(doc["fields"]["tags"][1], "web");
        assert_eq!(doc["fields"].as_object().map(|m| m.len()), Some(2));
    }

    #[test]
    fn empty_metadata_yields_empty_fields_object() {
        let doc = logstash_document(&LogRecord::new("warn", "m"));
        assert_eq!(doc["fields"], json!({}));
    }
}
