//! # ledger-ops-testkit
//!
//! Test helpers, fixtures and in-memory adapters.
//! This crate depends on `ports` and `shared`.

pub mod errors;
pub mod fixtures;
pub mod in_memory;

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_ports::ports_crate_version;
    use ledger_ops_shared::shared_crate_version;

    #[test]
    fn testkit_crate_compiles() {
        let version = testkit_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn testkit_can_use_ports_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }

    #[test]
    fn error_fixtures_are_available() {
        let codes = errors::common_error_codes();
        assert!(!codes.is_empty());
        assert_eq!(errors::exit_code_error(7).exit_code(), Some(7));
    }

    #[test]
    fn in_memory_adapters_are_available() {
        let _ = in_memory::NoopLogger;
        let _ = in_memory::InMemoryWorkspace::new();
    }
}
