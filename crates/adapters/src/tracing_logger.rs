//! `LoggerPort` adapter forwarding events to `tracing`.
//!
//! Used when JSON logging is not requested; the binary's subscriber decides
//! formatting and filtering.

use ledger_ops_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use ledger_ops_shared::redaction::{REDACTED, is_secret_key};
use serde_json::Value;

/// Logger that emits each event as a `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Create a logger with no base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());
        let rendered = render_fields(&fields);
        let error = event.error.map(|error| error.to_string()).unwrap_or_default();
        let name = event.event.as_ref();
        let message = event.message.as_ref();

        match event.level {
            LogLevel::Debug => {
                tracing::debug!(event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Info => {
                tracing::info!(event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Warn => {
                tracing::warn!(event = name, fields = %rendered, error = %error, "{message}");
            },
            LogLevel::Error => {
                tracing::error!(event = name, fields = %rendered, error = %error, "{message}");
            },
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
        })
    }
}

fn render_fields(fields: &LogFields) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            let shown = if is_secret_key(key) {
                REDACTED.to_owned()
            } else {
                match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                }
            };
            format!("{key}={shown}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_render_as_key_value_pairs() {
        let mut fields = LogFields::new();
        fields.insert("step".into(), json!("provision"));
        fields.insert("durationMs".into(), json!(12));
        fields.insert("authHeader".into(), json!("Bearer x"));
        assert_eq!(
            render_fields(&fields),
            "authHeader=[REDACTED] durationMs=12 step=provision"
        );
    }

    #[test]
    fn child_keeps_parent_fields() {
        let mut base = LogFields::new();
        base.insert("correlationId".into(), json!("run_1"));
        let logger = TracingLogger::new().child(base);
        logger.info("bootstrap.start", "no subscriber installed", None);
    }
}
