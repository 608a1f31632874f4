//! Error envelope types and helpers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Metadata key carrying the exit status of a failed external command.
pub const EXIT_CODE_METADATA_KEY: &str = "exitCode";

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (usage, missing configuration, failed delegated step).
    Expected,
    /// Invariant violations in domain logic.
    Invariant,
    /// Unexpected failures (I/O, process spawning).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => formatter.write_str("expected"),
            Self::Invariant => formatter.write_str("invariant"),
            Self::Unexpected => formatter.write_str("unexpected"),
        }
    }
}

/// Stable error code with namespace and identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Core cancellation code.
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// Invalid input code.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Not found code.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Permission denied code.
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// Timeout code.
    pub fn timeout() -> Self {
        Self::new("core", "timeout")
    }

    /// I/O error code.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure code.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error envelope shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    fn with_kind(kind: ErrorKind, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an expected error.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Expected, code, message)
    }

    /// Create an invariant error.
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Invariant, code, message)
    }

    /// Create an unexpected error.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unexpected, code, message)
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    /// Returns true if the error represents a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::cancelled()
    }

    /// Attach a single metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Exit status recorded by a failed external command, if any.
    ///
    /// Only numeric values stored under [`EXIT_CODE_METADATA_KEY`] count.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.metadata
            .get(EXIT_CODE_METADATA_KEY)
            .and_then(|value| value.parse().ok())
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}: {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        normalize_unexpected_error(&error)
    }
}

/// Normalize an arbitrary error into an unexpected envelope.
///
/// The source chain is searched for an `io::Error` so that missing files and
/// permission failures keep a stable code.
pub fn normalize_unexpected_error(error: &(dyn std::error::Error + 'static)) -> ErrorEnvelope {
    let code = find_io_error(error).map_or_else(ErrorCode::internal, |io_error| {
        error_code_from_io_kind(io_error.kind())
    });
    ErrorEnvelope::unexpected(code, error.to_string())
}

fn find_io_error<'a>(error: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);

    while let Some(candidate) = current {
        if let Some(io_error) = candidate.downcast_ref::<io::Error>() {
            return Some(io_error);
        }
        current = candidate.source();
    }

    None
}

fn error_code_from_io_kind(kind: io::ErrorKind) -> ErrorCode {
    match kind {
        io::ErrorKind::NotFound => ErrorCode::not_found(),
        io::ErrorKind::PermissionDenied => ErrorCode::permission_denied(),
        io::ErrorKind::TimedOut => ErrorCode::timeout(),
        io::ErrorKind::Interrupted => ErrorCode::cancelled(),
        _ => ErrorCode::io(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "wrapped: {}", self.0)
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn error_envelope_constructors() {
        let expected = ErrorEnvelope::expected(ErrorCode::invalid_input(), "invalid");
        assert_eq!(expected.kind, ErrorKind::Expected);
        assert_eq!(expected.code, ErrorCode::invalid_input());

        let invariant = ErrorEnvelope::invariant(ErrorCode::internal(), "boom");
        assert_eq!(invariant.kind, ErrorKind::Invariant);

        let unexpected = ErrorEnvelope::unexpected(ErrorCode::timeout(), "timeout");
        assert_eq!(unexpected.kind, ErrorKind::Unexpected);
    }

    #[test]
    fn io_errors_keep_stable_codes() {
        let missing: ErrorEnvelope = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(missing.code, ErrorCode::not_found());
        assert_eq!(missing.kind, ErrorKind::Unexpected);

        let denied: ErrorEnvelope = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(denied.code, ErrorCode::permission_denied());

        let other: ErrorEnvelope = io::Error::other("disk on fire").into();
        assert_eq!(other.code, ErrorCode::io());
    }

    #[test]
    fn normalize_walks_the_source_chain() {
        let wrapped = Wrapped(io::Error::new(io::ErrorKind::NotFound, "pem"));
        let envelope = normalize_unexpected_error(&wrapped);
        assert_eq!(envelope.code, ErrorCode::not_found());
        assert!(envelope.message.starts_with("wrapped:"));
    }

    #[test]
    fn exit_code_reads_numeric_metadata_only() {
        let error = ErrorEnvelope::expected(ErrorCode::new("bootstrap", "step_failed"), "fab")
            .with_metadata(EXIT_CODE_METADATA_KEY, "3");
        assert_eq!(error.exit_code(), Some(3));

        let garbled = error.with_metadata(EXIT_CODE_METADATA_KEY, "signal");
        assert_eq!(garbled.exit_code(), None);
    }

    #[test]
    fn display_includes_kind_and_code() {
        let error = ErrorEnvelope::cancelled("operation cancelled");
        assert!(error.is_cancelled());
        assert_eq!(
            error.to_string(),
            "expected core:cancelled: operation cancelled"
        );
    }
}
