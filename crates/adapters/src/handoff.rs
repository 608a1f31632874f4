//! Process hand-off adapter.
//!
//! On unix the current process image is replaced (`execvp`), so the server
//! keeps our pid and receives signals directly. Elsewhere the server runs as
//! a child and its exit code is reported back.

use ledger_ops_ports::{BoxFuture, HandoffOutcome, HandoffSpec, ProcessHandoffPort};
use ledger_ops_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::io;

/// Failure handing control to the successor program.
#[derive(Debug, thiserror::Error)]
#[error("failed to hand off to `{program}`: {source}")]
pub struct HandoffError {
    program: Box<str>,
    #[source]
    source: io::Error,
}

impl HandoffError {
    /// Stable error code for hand-off failures.
    #[must_use]
    pub fn error_code() -> ErrorCode {
        ErrorCode::new("proxy", "handoff_failed")
    }
}

impl From<HandoffError> for ErrorEnvelope {
    fn from(error: HandoffError) -> Self {
        Self::unexpected(HandoffError::error_code(), error.to_string())
            .with_metadata("program", error.program.into_string())
            .with_metadata("ioKind", error.source.kind().to_string())
    }
}

/// Hands off by `exec` on unix, by spawn-and-wait elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecHandoff;

impl ExecHandoff {
    /// Create the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessHandoffPort for ExecHandoff {
    fn hand_off(
        &self,
        ctx: &RequestContext,
        spec: HandoffSpec,
    ) -> BoxFuture<'_, Result<HandoffOutcome>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("proxy.hand_off")?;
            tracing::info!(program = %spec.program, args = ?spec.args, "handing off");
            hand_off_platform(spec).await
        })
    }
}

#[cfg(unix)]
#[allow(clippy::unused_async, reason = "exec never yields; signature shared with the spawn fallback")]
async fn hand_off_platform(spec: HandoffSpec) -> Result<HandoffOutcome> {
    use std::os::unix::process::CommandExt;

    let source = std::process::Command::new(spec.program.as_ref())
        .args(spec.args.iter().map(AsRef::<str>::as_ref))
        .exec();
    Err(HandoffError {
        program: spec.program,
        source,
    }
    .into())
}

#[cfg(not(unix))]
async fn hand_off_platform(spec: HandoffSpec) -> Result<HandoffOutcome> {
    let status = tokio::process::Command::new(spec.program.as_ref())
        .args(spec.args.iter().map(AsRef::<str>::as_ref))
        .status()
        .await
        .map_err(|source| HandoffError {
            program: spec.program.clone(),
            source,
        })?;
    Ok(HandoffOutcome::Exited(status.code().unwrap_or(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handoff_errors_carry_program() {
        let envelope: ErrorEnvelope = HandoffError {
            program: "nginx".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        }
        .into();
        assert_eq!(envelope.code.to_string(), "proxy:handoff_failed");
        assert_eq!(envelope.metadata.get("program").map(String::as_str), Some("nginx"));
    }

    #[tokio::test]
    async fn missing_program_fails_without_replacing_process() {
        let ctx = RequestContext::new_run();
        let result = ExecHandoff::new()
            .hand_off(
                &ctx,
                HandoffSpec {
                    program: "ledger-ops-no-such-server".into(),
                    args: vec!["-c".into(), "/dev/null".into()],
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(ref error) if error.code == HandoffError::error_code()
        ));
    }

    #[tokio::test]
    async fn cancelled_context_skips_handoff() {
        let ctx = RequestContext::new_run();
        ctx.cancel();
        let result = ExecHandoff::new()
            .hand_off(
                &ctx,
                HandoffSpec {
                    program: "true".into(),
                    args: Vec::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));
    }
}
