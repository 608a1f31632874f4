//! Logger selection for CLI runs.

use ledger_ops_adapters::{JsonLogger, LogSink, StderrLogSink, TracingLogger};
use ledger_ops_ports::{LogFields, LogLevel, LoggerPort};
use ledger_ops_shared::RequestContext;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Selects the JSON logger when set to `json`.
pub const LOG_FORMAT_ENV: &str = "LEDGER_OPS_LOG_FORMAT";
/// Minimum level for the JSON logger.
pub const LOG_LEVEL_ENV: &str = "LEDGER_OPS_LOG_LEVEL";

/// Build the run logger from an environment snapshot.
///
/// `LEDGER_OPS_LOG_FORMAT=json` writes JSON lines to stderr; anything else
/// forwards events to `tracing`, leaving filtering to the subscriber.
#[must_use]
pub fn logger_from_env(env: &BTreeMap<String, String>) -> Arc<dyn LoggerPort> {
    if env_is_json(env, LOG_FORMAT_ENV) {
        let sink: Arc<dyn LogSink> = Arc::new(StderrLogSink);
        Arc::new(JsonLogger::new(sink).with_min_level(parse_log_level(env)))
    } else {
        Arc::new(TracingLogger::new())
    }
}

/// Child logger tagging every event with the run's correlation id.
#[must_use]
pub fn scope_logger(logger: &dyn LoggerPort, ctx: &RequestContext) -> Arc<dyn LoggerPort> {
    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".into(),
        Value::String(ctx.correlation_id().as_str().to_owned()),
    );
    Arc::from(logger.child(fields))
}

fn env_is_json(env: &BTreeMap<String, String>, key: &str) -> bool {
    env.get(key)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

fn parse_log_level(env: &BTreeMap<String, String>) -> LogLevel {
    env.get(LOG_LEVEL_ENV)
        .and_then(|value| LogLevel::parse(value))
        .unwrap_or(LogLevel::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(parse_log_level(&env(&[])), LogLevel::Info);
        assert_eq!(
            parse_log_level(&env(&[(LOG_LEVEL_ENV, "loud")])),
            LogLevel::Info
        );
        assert_eq!(
            parse_log_level(&env(&[(LOG_LEVEL_ENV, "debug")])),
            LogLevel::Debug
        );
    }

    #[test]
    fn json_format_is_case_insensitive() {
        assert!(env_is_json(&env(&[(LOG_FORMAT_ENV, "JSON")]), LOG_FORMAT_ENV));
        assert!(!env_is_json(&env(&[(LOG_FORMAT_ENV, "text")]), LOG_FORMAT_ENV));
        assert!(!env_is_json(&env(&[]), LOG_FORMAT_ENV));
    }

    #[test]
    fn scoped_logger_accepts_events() {
        let logger = logger_from_env(&env(&[]));
        let scoped = scope_logger(logger.as_ref(), &RequestContext::new_run());
        scoped.debug("test.event", "scoped logger smoke", None);
    }
}
