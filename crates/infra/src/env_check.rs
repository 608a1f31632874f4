//! Environment validation helpers for CLI surfaces.

use ledger_ops_config::ProxyEnv;
use ledger_ops_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Snapshot of the process environment.
///
/// Variables whose name or value is not valid unicode are skipped; they can
/// never satisfy a required variable anyway.
#[must_use]
pub fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Validate that every variable the proxy template needs is present and
/// non-empty.
pub fn validate_proxy_env(env: &BTreeMap<String, String>) -> InfraResult<ProxyEnv> {
    ProxyEnv::from_map(env).map_err(ErrorEnvelope::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_config::PROXY_ENV_VARS;
    use ledger_ops_shared::ErrorCode;

    #[test]
    fn empty_value_is_reported_by_name() {
        let mut env: BTreeMap<String, String> = PROXY_ENV_VARS
            .iter()
            .map(|name| ((*name).to_owned(), "1".to_owned()))
            .collect();
        env.insert("DNS_SERVER".to_owned(), String::new());
        env.insert("HEALTH_CHECK_PORT".to_owned(), "  ".to_owned());

        let error = validate_proxy_env(&env).err();

        assert!(matches!(
            error,
            Some(ref envelope)
                if envelope.code == ErrorCode::new("config", "missing_env_var")
                    && envelope.metadata.get("env_vars").map(String::as_str) == Some("DNS_SERVER")
        ));
    }

    #[test]
    fn process_env_is_a_snapshot() {
        let env = process_env();
        assert!(env.keys().all(|key| !key.is_empty()));
    }
}
