//! Proxy entrypoint command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use crate::{CliOutput, format_error_output};
use ledger_ops_app::RenderProxyConfigOutput;
use ledger_ops_config::ProxyOptions;
use ledger_ops_infra::run_proxy_entrypoint;
use ledger_ops_ports::HandoffOutcome;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Run the proxy entrypoint command.
pub fn run_proxy(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    options: &ProxyOptions,
    render_only: bool,
) -> Result<CliOutput, CliError> {
    match run_proxy_entrypoint(env, options, render_only) {
        Ok(output) => format_render_output(mode, &output),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

fn format_render_output(
    mode: OutputMode,
    output: &RenderProxyConfigOutput,
) -> Result<CliOutput, CliError> {
    // The server ran as a child and already used the terminal.
    if let Some(HandoffOutcome::Exited(code)) = output.handoff {
        return Ok(CliOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: ExitCode::from_child(code),
        });
    }

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "render": output,
        }))?
    } else {
        format_render_text(output)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_render_text(output: &RenderProxyConfigOutput) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    let _ = writeln!(out, "configFile: {}", output.config_file.display());
    let _ = writeln!(out, "changed: {}", output.changed);
    let _ = writeln!(out, "replacements: {}", output.total_replacements());
    for entry in &output.replacements {
        let _ = writeln!(out, "  {}: {}", entry.token, entry.count);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use ledger_ops_domain::TokenReplacement;
    use std::path::PathBuf;

    fn output(handoff: Option<HandoffOutcome>) -> RenderProxyConfigOutput {
        RenderProxyConfigOutput {
            config_file: PathBuf::from("/etc/nginx/nginx.conf"),
            replacements: vec![
                TokenReplacement {
                    token: "DNS_SERVER".into(),
                    count: 1,
                },
                TokenReplacement {
                    token: "HEALTH_CHECK_PORT".into(),
                    count: 0,
                },
            ],
            changed: true,
            handoff,
        }
    }

    #[test]
    fn text_summary_lists_every_token() -> Result<(), CliError> {
        let mode = OutputMode {
            format: OutputFormat::Text,
        };
        let rendered = format_render_output(mode, &output(None))?;
        assert_eq!(rendered.exit_code, ExitCode::Ok);
        assert!(rendered.stdout.contains("replacements: 1\n"));
        assert!(rendered.stdout.contains("  DNS_SERVER: 1\n"));
        assert!(rendered.stdout.contains("  HEALTH_CHECK_PORT: 0\n"));
        Ok(())
    }

    #[test]
    fn returned_server_exit_code_is_propagated() -> Result<(), CliError> {
        let mode = OutputMode {
            format: OutputFormat::Json,
        };
        let rendered = format_render_output(mode, &output(Some(HandoffOutcome::Exited(3))))?;
        assert_eq!(rendered.exit_code.as_u8(), 3);
        assert!(rendered.stdout.is_empty());
        Ok(())
    }
}
