//! Test fixtures for shared error codes and envelopes.

use ledger_ops_shared::{EXIT_CODE_METADATA_KEY, ErrorCode, ErrorEnvelope};

/// Return a list of common error codes used in tests.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::cancelled(),
        ErrorCode::invalid_input(),
        ErrorCode::not_found(),
        ErrorCode::timeout(),
        ErrorCode::io(),
        ErrorCode::internal(),
    ]
}

/// A cancellation error fixture.
pub fn cancelled_error() -> ErrorEnvelope {
    ErrorEnvelope::cancelled("cancelled")
}

/// A timeout error fixture.
pub fn timeout_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::timeout(), "timeout")
}

/// An error carrying a child's exit status.
pub fn exit_code_error(code: i32) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::new("bootstrap", "step_failed"), "step failed")
        .with_metadata(EXIT_CODE_METADATA_KEY, code.to_string())
}
