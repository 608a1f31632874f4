//! # ledger-ops-domain
//!
//! Value types for the ledger deployment workflows:
//!
//! - **Primitives** - `ClusterTag`, `NodeCount`, `HostName`, `ClusterDescriptor`
//! - **Template** - literal placeholder substitution with per-token counts
//! - **Membership** - genesis host extraction from the storage config
//! - **Steps** - the ordered `BootstrapStep` catalogue
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use ledger_ops_shared::shared_crate_version;

pub mod membership;
pub mod primitives;
pub mod steps;
pub mod template;

pub use membership::{MembershipError, genesis_host, host_from_membership_line};
pub use primitives::{
    BOOTSTRAP_USAGE, ClusterDescriptor, ClusterTag, HostName, NodeCount, PrimitiveError,
};
pub use steps::BootstrapStep;
pub use template::{
    RenderedTemplate, TokenReplacement, remaining_tokens, render_args, render_placeholders,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
