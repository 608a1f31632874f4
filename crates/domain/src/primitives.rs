//! Domain primitives with validated constructors.

use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Usage line printed when the bootstrap positionals are missing.
pub const BOOTSTRAP_USAGE: &str = "usage: ledger-ops bootstrap <TAG> <NUM_NODES>";

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// The cluster tag argument is missing or empty.
    MissingClusterTag,
    /// The node count argument is missing or empty.
    MissingNodeCount,
    /// A host name is empty after trimming.
    EmptyHostName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingClusterTag | Self::MissingNodeCount => ErrorCode::new("bootstrap", "usage"),
            Self::EmptyHostName { .. } => ErrorCode::new("domain", "invalid_host_name"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingClusterTag => formatter.write_str("cluster tag must be non-empty"),
            Self::MissingNodeCount => formatter.write_str("node count must be non-empty"),
            Self::EmptyHostName { .. } => formatter.write_str("HostName must be non-empty"),
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::MissingClusterTag => envelope.with_metadata("argument", "TAG"),
            PrimitiveError::MissingNodeCount => envelope.with_metadata("argument", "NUM_NODES"),
            PrimitiveError::EmptyHostName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
        }
    }
}

/// Tag applied to every provisioned instance of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterTag(Box<str>);

impl ClusterTag {
    /// Parse a tag; only the empty string is rejected. The value is kept verbatim.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(PrimitiveError::MissingClusterTag);
        }
        Ok(Self(input.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Requested number of nodes, kept as the operator typed it.
///
/// The value is forwarded verbatim to the provisioning helper, which owns
/// numeric validation. [`NodeCount::as_u32`] is a best-effort view for logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeCount(Box<str>);

impl NodeCount {
    /// Parse a node count; only the empty string is rejected.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(PrimitiveError::MissingNodeCount);
        }
        Ok(Self(input.into()))
    }

    /// Access the raw value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view, if the raw value happens to be a number.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for NodeCount {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Positional arguments of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescriptor {
    /// Cluster tag.
    pub tag: ClusterTag,
    /// Requested node count.
    pub node_count: NodeCount,
}

impl ClusterDescriptor {
    /// Build a descriptor from optional positionals.
    ///
    /// The tag is checked first, so a run with no arguments reports the tag.
    pub fn from_args(tag: Option<&str>, node_count: Option<&str>) -> Result<Self, PrimitiveError> {
        let tag = ClusterTag::parse(tag.unwrap_or_default())?;
        let node_count = NodeCount::parse(node_count.unwrap_or_default())?;
        Ok(Self { tag, node_count })
    }
}

/// Remote host name or address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostName(Box<str>);

impl HostName {
    /// Parse a host name; blank input is rejected.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::EmptyHostName {
                input_length: raw.len(),
            });
        };
        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
