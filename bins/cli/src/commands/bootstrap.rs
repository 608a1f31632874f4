//! Bootstrap command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use crate::{CliOutput, format_error_output};
use ledger_ops_app::{BootstrapPlan, BootstrapReport, PlannedAction};
use ledger_ops_domain::BOOTSTRAP_USAGE;
use ledger_ops_infra::{BootstrapLocalArgs, plan_bootstrap_local, run_bootstrap_local};
use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use std::fmt::Write as _;
use std::path::Path;

/// Run the bootstrap command, or print its plan on a dry run.
pub fn run_bootstrap(
    mode: OutputMode,
    args: &BootstrapLocalArgs,
    dry_run: bool,
) -> Result<CliOutput, CliError> {
    if dry_run {
        return match plan_bootstrap_local(args) {
            Ok(plan) => format_plan_output(mode, &plan),
            Err(error) => Ok(format_bootstrap_error(mode, &error)),
        };
    }

    match run_bootstrap_local(args) {
        Ok(report) => format_report_output(mode, &report),
        Err(error) => Ok(format_bootstrap_error(mode, &error)),
    }
}

fn format_bootstrap_error(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let mut output = format_error_output(mode, error);
    if error.code == ErrorCode::new("bootstrap", "usage") {
        output.stderr.insert_str(0, &format!("{BOOTSTRAP_USAGE}\n"));
    }
    output
}

fn format_report_output(mode: OutputMode, report: &BootstrapReport) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "report": report,
        }))?
    } else {
        format_report_text(report)
    };
    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_report_text(report: &BootstrapReport) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    let _ = writeln!(out, "tag: {}", report.tag);
    let _ = writeln!(out, "nodes: {}", report.node_count);
    let _ = writeln!(out, "genesisHost: {}", report.genesis_host);
    out.push_str("steps:\n");
    for record in &report.steps {
        let _ = writeln!(out, "  {}: {}ms", record.step, record.duration_ms);
    }
    let _ = writeln!(out, "durationMs: {}", report.duration_ms);
    out
}

fn format_plan_output(mode: OutputMode, plan: &BootstrapPlan) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "plan": plan,
        }))?
    } else {
        format_plan_text(plan)
    };
    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_plan_text(plan: &BootstrapPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "workdir: {}", plan.workdir.display());
    for (index, planned) in plan.steps.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {}: {}",
            index + 1,
            planned.step,
            describe_action(&planned.action)
        );
    }
    out
}

fn describe_action(action: &PlannedAction) -> String {
    match action {
        PlannedAction::ValidateArguments { tag, nodes } => format!("tag={tag} nodes={nodes}"),
        PlannedAction::CheckTools { tools } => format!("require {}", tools.join(" ")),
        PlannedAction::CheckCredential { path } => format!("require {} (mode 0400)", path.display()),
        PlannedAction::Run { argv } => argv.join(" "),
        PlannedAction::RunScript { script } => format!("chmod +x and run {}", script.display()),
        PlannedAction::AssembleConfig {
            template,
            fragment,
            target,
        } => format!(
            "{} + {} -> {}",
            template.display(),
            fragment.display(),
            target.display()
        ),
        PlannedAction::RemoveFiles { paths } => format!("remove {}", join_paths(paths)),
    }
}

fn join_paths(paths: &[impl AsRef<Path>]) -> String {
    paths
        .iter()
        .map(|path| path.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
