//! # ledger-ops-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local bootstrap pipeline wiring.
pub mod bootstrap_local;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger selection from the environment.
pub mod observability;
/// Local proxy entrypoint wiring.
pub mod proxy_local;
/// Runtime and interrupt handling.
pub mod runtime;

pub use bootstrap_local::{BootstrapLocalArgs, plan_bootstrap_local, run_bootstrap_local};
pub use env_check::{InfraError, InfraResult, process_env, validate_proxy_env};
pub use observability::{LOG_FORMAT_ENV, LOG_LEVEL_ENV, logger_from_env, scope_logger};
pub use proxy_local::run_proxy_entrypoint;
pub use runtime::run_with_interrupt;

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_adapters::adapters_crate_version;
    use ledger_ops_app::app_crate_version;
    use ledger_ops_config::config_crate_version;
    use ledger_ops_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if in_deps && line.starts_with("ledger-ops-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn infra_depends_on_app_adapters_config() {
        let deps = workspace_deps();
        let required = [
            "ledger-ops-app",
            "ledger-ops-adapters",
            "ledger-ops-config",
        ];

        for expected in required {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
        assert!(!deps.iter().any(|dep| dep == "ledger-ops-testkit"));
    }

    #[test]
    fn infra_can_use_app_adapters_config_shared() {
        assert!(!infra_crate_version().is_empty());
        assert!(!app_crate_version().is_empty());
        assert!(!adapters_crate_version().is_empty());
        assert!(!config_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
