use ledger_ops_shared::ErrorEnvelope;
use std::fmt;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok,
    Failure,
    Interrupted,
    /// Propagated from a delegated command or the proxy server.
    Child(u8),
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Failure => 1,
            Self::Interrupted => 130,
            Self::Child(code) => code,
        }
    }

    /// Map a child exit code; out-of-range or zero codes collapse to failure.
    #[must_use]
    pub fn from_child(code: i32) -> Self {
        match u8::try_from(code) {
            Ok(0) => Self::Ok,
            Ok(code) => Self::Child(code),
            Err(_) => Self::Failure,
        }
    }

    /// Exit status for a failed run.
    #[must_use]
    pub fn for_error(error: &ErrorEnvelope) -> Self {
        if error.is_cancelled() {
            return Self::Interrupted;
        }
        match error.exit_code().map(Self::from_child) {
            Some(Self::Child(code)) => Self::Child(code),
            _ => Self::Failure,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) | Self::Serialization(_) => ExitCode::Failure,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_shared::{EXIT_CODE_METADATA_KEY, ErrorCode};

    #[test]
    fn step_exit_code_is_propagated() {
        let error = ErrorEnvelope::expected(ErrorCode::new("bootstrap", "step_failed"), "boom")
            .with_metadata(EXIT_CODE_METADATA_KEY, "7");
        assert_eq!(ExitCode::for_error(&error), ExitCode::Child(7));
    }

    #[test]
    fn signaled_step_exits_one() {
        let error = ErrorEnvelope::expected(ErrorCode::new("bootstrap", "step_failed"), "boom")
            .with_metadata("signaled", "true");
        assert_eq!(ExitCode::for_error(&error).as_u8(), 1);
    }

    #[test]
    fn cancellation_exits_130() {
        let error = ErrorEnvelope::cancelled("interrupted");
        assert_eq!(ExitCode::for_error(&error).as_u8(), 130);
    }

    #[test]
    fn child_codes_outside_u8_collapse_to_failure() {
        assert_eq!(ExitCode::from_child(-1), ExitCode::Failure);
        assert_eq!(ExitCode::from_child(300), ExitCode::Failure);
        assert_eq!(ExitCode::from_child(0), ExitCode::Ok);
    }
}
