//! External command runner built on `tokio::process`.
//!
//! Child output is streamed line by line to the operator's terminal and a
//! bounded tail is kept for the returned [`CommandOutput`]. The child is
//! killed if the request is cancelled or the future is dropped.
//!
//! Once the child exits, its pipes are read for at most [`PIPE_DRAIN_GRACE`].
//! A background process started by the child can inherit them and keep them
//! open long after the child itself is gone.

use ledger_ops_ports::{BoxFuture, CommandOutput, CommandPort, CommandSpec, CommandStatus};
use ledger_ops_shared::{ErrorEnvelope, RequestContext, Result, normalize_unexpected_error};
use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Default number of captured bytes kept per stream.
pub const DEFAULT_CAPTURE_LIMIT_BYTES: usize = 64 * 1024;

/// How long child pipes are still read after the child has exited.
pub const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Failures starting or awaiting a child process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program name.
        program: Box<str>,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The child could not be awaited.
    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        /// Program name.
        program: Box<str>,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl From<ProcessError> for ErrorEnvelope {
    fn from(error: ProcessError) -> Self {
        let envelope = normalize_unexpected_error(&error);
        match error {
            ProcessError::Spawn { program, .. } | ProcessError::Wait { program, .. } => {
                envelope.with_metadata("program", program.into_string())
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EchoTarget {
    Stdout,
    Stderr,
}

/// Command runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    echo: bool,
    capture_limit_bytes: usize,
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self {
            echo: true,
            capture_limit_bytes: DEFAULT_CAPTURE_LIMIT_BYTES,
        }
    }
}

impl TokioCommandRunner {
    /// Runner that echoes child output and keeps the default tail size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable echoing child output to this process's streams.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Set the captured tail size per stream.
    #[must_use]
    pub const fn with_capture_limit(mut self, bytes: usize) -> Self {
        self.capture_limit_bytes = bytes;
        self
    }
}

impl CommandPort for TokioCommandRunner {
    fn run(&self, ctx: &RequestContext, spec: CommandSpec) -> BoxFuture<'_, Result<CommandOutput>> {
        let ctx = ctx.clone();
        let echo = self.echo;
        let limit = self.capture_limit_bytes;
        Box::pin(async move {
            ctx.ensure_not_cancelled("process.run")?;

            let mut command = tokio::process::Command::new(spec.program.as_ref());
            command
                .args(spec.args.iter().map(AsRef::<str>::as_ref))
                .stdin(Stdio::inherit())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &spec.working_dir {
                command.current_dir(dir);
            }

            tracing::debug!(label = %spec.label, command = %spec, "spawning command");
            let started = Instant::now();
            let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

            let mut pumps = OutputPumps::start(&mut child, echo, limit);

            let waited = tokio::select! {
                status = child.wait() => Some(status),
                () = ctx.cancelled() => None,
            };
            let Some(status) = waited else {
                if let Err(error) = child.kill().await {
                    tracing::warn!(label = %spec.label, %error, "failed to kill cancelled command");
                }
                return Err(ErrorEnvelope::cancelled("command cancelled")
                    .with_metadata("label", spec.label.as_ref()));
            };
            let status = status.map_err(|source| ProcessError::Wait {
                program: spec.program.clone(),
                source,
            })?;

            pumps.drain(&spec.label).await;
            let stdout = pumps.stdout.contents();
            let stderr = pumps.stderr.contents();
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            Ok(CommandOutput {
                status: status
                    .code()
                    .map_or(CommandStatus::Signaled, CommandStatus::Exited),
                stdout: stdout.into_boxed_str(),
                stderr: stderr.into_boxed_str(),
                duration_ms,
            })
        })
    }
}

/// Reader tasks for both child streams. Dropping this aborts them.
struct OutputPumps {
    stdout: SharedTail,
    stderr: SharedTail,
    tasks: [JoinHandle<()>; 2],
}

impl OutputPumps {
    fn start(child: &mut Child, echo: bool, limit: usize) -> Self {
        let stdout = SharedTail::new(limit);
        let stderr = SharedTail::new(limit);
        let tasks = [
            tokio::spawn(pump(child.stdout.take(), EchoTarget::Stdout, echo, stdout.clone())),
            tokio::spawn(pump(child.stderr.take(), EchoTarget::Stderr, echo, stderr.clone())),
        ];
        Self {
            stdout,
            stderr,
            tasks,
        }
    }

    /// Wait for both streams to reach EOF, giving up after [`PIPE_DRAIN_GRACE`].
    async fn drain(&mut self, label: &str) {
        let deadline = tokio::time::Instant::now() + PIPE_DRAIN_GRACE;
        for task in &mut self.tasks {
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                tracing::debug!(label, "child output still open after exit; keeping the tail read so far");
                return;
            }
        }
    }
}

impl Drop for OutputPumps {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn pump<R>(reader: Option<R>, target: EchoTarget, echo: bool, tail: SharedTail)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if echo {
                    echo_line(target, &line).await;
                }
                tail.push(&String::from_utf8_lossy(&line));
            },
            Err(error) => {
                tracing::debug!(%error, "child stream read failed");
                break;
            },
        }
    }
}

async fn echo_line(target: EchoTarget, line: &[u8]) {
    let written = match target {
        EchoTarget::Stdout => tokio::io::stdout().write_all(line).await,
        EchoTarget::Stderr => tokio::io::stderr().write_all(line).await,
    };
    if let Err(error) = written {
        tracing::debug!(%error, "echoing child output failed");
    }
}

/// Tail shared between a reader task and the runner.
#[derive(Clone)]
struct SharedTail(Arc<Mutex<TailBuffer>>);

impl SharedTail {
    fn new(limit: usize) -> Self {
        Self(Arc::new(Mutex::new(TailBuffer::new(limit))))
    }

    fn push(&self, line: &str) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(line);
    }

    fn contents(&self) -> String {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).contents()
    }
}

/// Keeps the most recent lines whose total size fits within a byte limit.
struct TailBuffer {
    lines: VecDeque<String>,
    bytes: usize,
    limit: usize,
}

impl TailBuffer {
    const fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            limit,
        }
    }

    fn push(&mut self, line: &str) {
        self.bytes += line.len();
        self.lines.push_back(line.to_owned());
        while self.bytes > self.limit {
            let Some(dropped) = self.lines.pop_front() else {
                break;
            };
            self.bytes -= dropped.len();
        }
    }

    fn contents(&self) -> String {
        self.lines.iter().map(String::as_str).collect()
    }
}
