//! External command boundary contract.
//!
//! Every delegated pipeline step goes through [`CommandPort::run`] and comes
//! back as one uniform [`CommandOutput`]. A non-zero exit is a normal output,
//! not an error; callers decide what a failed status means.

use crate::BoxFuture;
use ledger_ops_shared::{RequestContext, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Short label used in logs (usually the pipeline step name).
    pub label: Box<str>,
    /// Program name (resolved through `PATH`) or path.
    pub program: Box<str>,
    /// Arguments, passed verbatim.
    pub args: Vec<Box<str>>,
    /// Working directory for the child, if different from the caller's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec with no arguments.
    pub fn new(label: impl Into<Box<str>>, program: impl Into<Box<str>>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Build a spec from an argv vector (`argv[0]` is the program).
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv<I, S>(label: impl Into<Box<str>>, argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next()?;
        Some(Self {
            label: label.into(),
            program,
            args: argv.collect(),
            working_dir: None,
        })
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Box<str>>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run the child in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.program)?;
        for arg in &self.args {
            write!(formatter, " {arg}")?;
        }
        Ok(())
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "code")]
pub enum CommandStatus {
    /// Normal exit with a status code.
    Exited(i32),
    /// Terminated by a signal.
    Signaled,
}

impl CommandStatus {
    /// True for a zero exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Exit code, when the child exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(code),
            Self::Signaled => None,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(formatter, "exit status {code}"),
            Self::Signaled => formatter.write_str("terminated by signal"),
        }
    }
}

/// Uniform result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    /// Exit status.
    pub status: CommandStatus,
    /// Captured stdout (tail, bounded by the adapter).
    pub stdout: Box<str>,
    /// Captured stderr (tail, bounded by the adapter).
    pub stderr: Box<str>,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl CommandOutput {
    /// A successful output with no captured text.
    #[must_use]
    pub fn success() -> Self {
        Self::with_status(CommandStatus::Exited(0))
    }

    /// An output with the given status and no captured text.
    #[must_use]
    pub fn with_status(status: CommandStatus) -> Self {
        Self {
            status,
            stdout: Box::default(),
            stderr: Box::default(),
            duration_ms: 0,
        }
    }
}

/// Boundary contract for running external commands.
pub trait CommandPort: Send + Sync {
    /// Run a command to completion.
    ///
    /// Returns `Err` only when the command could not be started or awaited,
    /// or when `ctx` was cancelled (the child is killed in that case).
    fn run(&self, ctx: &RequestContext, spec: CommandSpec) -> BoxFuture<'_, Result<CommandOutput>>;
}

/// Boundary contract for resolving tool names to executables.
pub trait ToolLocatorPort: Send + Sync {
    /// Resolve `tool` to an executable path, if available.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program() {
        let spec = CommandSpec::from_argv("provision", ["python", "run_and_tag.py", "--tag", "v1"]);
        assert!(matches!(
            spec,
            Some(ref spec) if spec.program.as_ref() == "python" && spec.args.len() == 3
        ));
        assert!(CommandSpec::from_argv("empty", Vec::<String>::new()).is_none());
    }

    #[test]
    fn display_joins_argv() {
        let spec = CommandSpec::new("start-cluster", "fab").arg("start_bigchaindb_nodes");
        assert_eq!(spec.to_string(), "fab start_bigchaindb_nodes");
    }

    #[test]
    fn status_helpers() {
        assert!(CommandStatus::Exited(0).is_success());
        assert!(!CommandStatus::Exited(2).is_success());
        assert_eq!(CommandStatus::Exited(2).code(), Some(2));
        assert_eq!(CommandStatus::Signaled.code(), None);
    }
}
