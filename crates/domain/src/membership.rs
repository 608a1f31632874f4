//! Storage-backend membership parsing.
//!
//! The assembled storage config ends with join directives of the form
//! `join=<host>:<port>`. The genesis node is the host on the last line.

use crate::primitives::{HostName, PrimitiveError};
use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Failure to locate the genesis host in a storage config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// The config has no lines.
    EmptyConfig,
    /// The last line yields an empty host.
    EmptyHost {
        /// The offending line.
        line: String,
    },
}

impl fmt::Display for MembershipError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyConfig => formatter.write_str("storage config is empty"),
            Self::EmptyHost { line } => {
                write!(formatter, "no host found on last config line: {line:?}")
            },
        }
    }
}

impl std::error::Error for MembershipError {}

impl From<MembershipError> for ErrorEnvelope {
    fn from(error: MembershipError) -> Self {
        let envelope = Self::expected(
            ErrorCode::new("bootstrap", "invalid_membership"),
            error.to_string(),
        );
        match error {
            MembershipError::EmptyConfig => envelope,
            MembershipError::EmptyHost { line } => envelope.with_metadata("line", line),
        }
    }
}

/// Extract the host from one membership line.
///
/// Keeps the text before the first `:`, then the second `=`-separated field.
/// Without an `=` the whole field is the host.
pub fn host_from_membership_line(line: &str) -> Result<HostName, MembershipError> {
    let before_port = line.split(':').next().unwrap_or_default();
    let host = before_port.split('=').nth(1).unwrap_or(before_port);
    HostName::parse(host).map_err(|_: PrimitiveError| MembershipError::EmptyHost {
        line: line.to_owned(),
    })
}

/// Genesis host: the host named on the last line of the storage config.
///
/// A trailing newline does not start a new line.
pub fn genesis_host(config_text: &str) -> Result<HostName, MembershipError> {
    let last = config_text.lines().last().ok_or(MembershipError::EmptyConfig)?;
    host_from_membership_line(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_comes_from_last_join_line() -> Result<(), MembershipError> {
        let config = "bind=all\ndirect-io\njoin=ec2-52-1-1-1.compute.amazonaws.com:29015\njoin=ec2-52-2-2-2.compute.amazonaws.com:29015\n";
        let host = genesis_host(config)?;
        assert_eq!(host.as_str(), "ec2-52-2-2-2.compute.amazonaws.com");
        Ok(())
    }

    #[test]
    fn line_without_equals_uses_whole_field() -> Result<(), MembershipError> {
        let host = host_from_membership_line("10.0.0.5:29015")?;
        assert_eq!(host.as_str(), "10.0.0.5");
        Ok(())
    }

    #[test]
    fn only_second_equals_field_is_kept() -> Result<(), MembershipError> {
        let host = host_from_membership_line("join=node-a=extra:29015")?;
        assert_eq!(host.as_str(), "node-a");
        Ok(())
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(genesis_host(""), Err(MembershipError::EmptyConfig));
        assert!(matches!(
            genesis_host("join=node:1\njoin=:29015"),
            Err(MembershipError::EmptyHost { .. })
        ));
    }

    #[test]
    fn errors_map_to_bootstrap_code() {
        let envelope: ErrorEnvelope = MembershipError::EmptyHost {
            line: "join=".to_owned(),
        }
        .into();
        assert_eq!(envelope.code.to_string(), "bootstrap:invalid_membership");
        assert_eq!(envelope.metadata.get("line").map(String::as_str), Some("join="));
    }
}
