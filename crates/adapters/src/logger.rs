//! Structured JSON logger adapter.

use ledger_ops_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use ledger_ops_shared::redaction::{REDACTED, is_secret_key};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A sink that receives pre-formatted log lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Log sink that writes to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// JSON logger emitting one line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn encode(&self, event: LogEvent) -> String {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());

        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_owned(), Value::from(now_epoch_ms()));
        payload.insert("level".to_owned(), Value::from(event.level.as_str()));
        payload.insert("event".to_owned(), Value::from(event.event.as_ref()));
        payload.insert("message".to_owned(), Value::from(event.message.as_ref()));
        if !fields.is_empty() {
            let mut object: serde_json::Map<String, Value> = fields
                .into_iter()
                .map(|(key, value)| (key.into_string(), value))
                .collect();
            redact_object(&mut object);
            payload.insert("fields".to_owned(), Value::Object(object));
        }
        if let Some(mut error) = event.error {
            redact_value(&mut error);
            payload.insert("error".to_owned(), error);
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| {
                "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n"
                    .to_owned()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }
        let line = self.encode(event);
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

fn redact_object(map: &mut serde_json::Map<String, Value>) {
    for (key, nested) in map.iter_mut() {
        if is_secret_key(key) {
            *nested = Value::from(REDACTED);
        } else {
            redact_value(nested);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => redact_object(map),
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
