//! # ledger-ops-adapters
//!
//! Adapter implementations for ports: child processes, `PATH` lookup, the
//! local workspace filesystem, process hand-off and log sinks.
//! This crate depends on `ports` and `shared`.

pub mod handoff;
pub mod logger;
pub mod process;
pub mod tools;
pub mod tracing_logger;
pub mod workspace;

pub use handoff::{ExecHandoff, HandoffError};
pub use logger::{JsonLogger, LogSink, StderrLogSink};
pub use process::{
    DEFAULT_CAPTURE_LIMIT_BYTES, PIPE_DRAIN_GRACE, ProcessError, TokioCommandRunner,
};
pub use tools::PathToolLocator;
pub use tracing_logger::TracingLogger;
pub use workspace::LocalWorkspace;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_ports::ports_crate_version;
    use ledger_ops_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
                continue;
            }
            if line.starts_with("ledger-ops-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let deps = workspace_deps();
        let forbidden = ["ledger-ops-app", "ledger-ops-infra", "ledger-ops-config"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
        assert!(deps.iter().any(|dep| dep == "ledger-ops-ports"));
    }

    #[test]
    fn adapters_crate_compiles() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
