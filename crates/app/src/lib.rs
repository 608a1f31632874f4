//! # ledger-ops-app
//!
//! Application use cases for the proxy entrypoint and the cluster bootstrap.
//! This crate depends on `ports`, `config`, `domain`, and `shared`.

pub mod bootstrap_cluster;
pub mod plan_bootstrap;
pub mod render_proxy_config;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use bootstrap_cluster::{
    BootstrapClusterDeps, BootstrapClusterInput, BootstrapError, BootstrapReport,
    STDERR_TAIL_BYTES, StepRecord, bootstrap_cluster, ensure_success,
};
pub use plan_bootstrap::{BootstrapPlan, PlannedAction, PlannedStep, plan_bootstrap};
pub use render_proxy_config::{
    RenderProxyConfigDeps, RenderProxyConfigInput, RenderProxyConfigOutput, render_proxy_config,
};
