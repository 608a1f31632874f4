//! # ledger-ops-shared
//!
//! Foundational types used by every other crate in the workspace:
//!
//! - `ErrorEnvelope` and the shared `Result` alias
//! - `RequestContext` with correlation id and cooperative cancellation
//! - Timeout and redaction helpers
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod redaction;
pub mod result;
pub mod timeout;

pub use concurrency::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{
    EXIT_CODE_METADATA_KEY, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata,
    normalize_unexpected_error,
};
pub use redaction::{REDACTED, is_secret_key, redact_if_secret};
pub use result::Result;
pub use timeout::timeout_with_context;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
