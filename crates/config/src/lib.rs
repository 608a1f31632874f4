//! # ledger-ops-config
//!
//! Configuration for both workflows: the proxy entrypoint's required
//! environment and options, and the bootstrap pipeline's TOML schema.
//! This crate depends on `domain` and `shared` only.

/// Bootstrap configuration schema and validation.
pub mod bootstrap;
/// Proxy entrypoint environment contract.
pub mod env;
/// Config loading helpers.
pub mod load;
/// Proxy entrypoint options.
pub mod proxy;

pub use bootstrap::{
    BootstrapConfig, BootstrapConfigError, BootstrapPaths, OrchestrationPhases,
    ProvisioningHelpers, RequiredTools, SLOT_HOST, SLOT_NODES, SLOT_TAG, ValidatedBootstrapConfig,
    parse_bootstrap_config_toml,
};
pub use env::{EnvParseError, PROXY_ENV_VARS, ProxyEnv};
pub use load::{load_bootstrap_config, to_pretty_toml};
pub use proxy::{DEFAULT_PROXY_CONFIG_FILE, DEFAULT_PROXY_SERVER, ProxyOptions};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
