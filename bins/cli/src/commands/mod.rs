//! CLI command handlers.

pub mod bootstrap;
pub mod proxy;

pub use bootstrap::run_bootstrap;
pub use proxy::run_proxy;
