//! Process hand-off boundary contract.

use crate::BoxFuture;
use ledger_ops_shared::{RequestContext, Result};
use serde::Serialize;

/// Program that takes over once preparation is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffSpec {
    /// Program name or path.
    pub program: Box<str>,
    /// Arguments, passed verbatim.
    pub args: Vec<Box<str>>,
}

/// Result of a hand-off that returned control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandoffOutcome {
    /// The successor ran as a child and exited with this code.
    Exited(i32),
}

/// Boundary contract for replacing the current process with a successor.
///
/// Where the platform supports it the implementation replaces the process
/// image and never returns on success. Otherwise it runs the successor as a
/// child, waits, and reports the exit code.
pub trait ProcessHandoffPort: Send + Sync {
    /// Hand control to the successor program.
    fn hand_off(&self, ctx: &RequestContext, spec: HandoffSpec)
    -> BoxFuture<'_, Result<HandoffOutcome>>;
}
