use crate::record::LogRecord;
use crate::shipper::Shipper;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets whose events are never shipped: the shipper's own diagnostics
/// and the HTTP stack underneath it would otherwise feed back into it.
const IGNORED_TARGETS: &[&str] = &["tracing_es_shipper", "reqwest", "hyper", "h2", "rustls"];

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`Shipper`].
///
/// Only events at or above the shipper's configured level are forwarded.
/// Delivery runs on the shipper's runtime, never on the thread that emitted
/// the event.
pub struct ShipperLayer {
    shipper: Shipper,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the shipper.
    pub forwarded_events: Arc<AtomicU64>,
}

impl ShipperLayer {
    pub fn new(shipper: Shipper) -> Self {
        Self {
            shipper,
            total_events: Arc::new(AtomicU64::new(0)),
            forwarded_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn is_ignored(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|prefix| {
        target == *prefix || target.strip_prefix(prefix).map_or(false, |rest| rest.starts_with("::"))
    })
}

impl<S> Layer<S> for ShipperLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if *meta.level() > self.shipper.level() || is_ignored(meta.target()) {
            return;
        }

        let mut metadata = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut metadata, message: &mut message };
        event.record(&mut visitor);

        metadata.insert("target".to_string(), serde_json::Value::from(meta.target()));
        if let Some(module_path) = meta.module_path() {
            metadata.insert("module_path".to_string(), serde_json::Value::from(module_path));
        }
        if let Some(file) = meta.file() {
            metadata.insert("file".to_string(), serde_json::Value::from(file));
        }
        if let Some(line) = meta.line() {
            metadata.insert("line".to_string(), serde_json::Value::from(line));
        }

        let record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().as_str().to_ascii_lowercase(),
            message: message.unwrap_or_default(),
            metadata,
        };

        // The handle is dropped; the write keeps running on its own task.
        let _ = self.shipper.log(record);
        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
