//! Bring up a tagged cluster: provision, configure, install, start.
//!
//! The pipeline is strictly linear. The first failing step aborts the run and
//! nothing is rolled back: provisioned instances and transient files stay in
//! place for the operator to inspect.

use crate::plan_bootstrap::{command_template, descriptor_bindings, transient_files};
use ledger_ops_config::{SLOT_HOST, ValidatedBootstrapConfig};
use ledger_ops_domain::{
    BootstrapStep, ClusterDescriptor, ClusterTag, HostName, NodeCount, genesis_host, render_args,
};
use ledger_ops_ports::{
    CommandOutput, CommandPort, CommandSpec, CommandStatus, LogFields, LoggerPort,
    PermissionChange, ToolLocatorPort, WorkspacePort,
};
use ledger_ops_shared::{
    EXIT_CODE_METADATA_KEY, ErrorCode, ErrorEnvelope, RequestContext, Result,
    timeout_with_context,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bytes of child stderr kept in a `step_failed` error.
pub const STDERR_TAIL_BYTES: usize = 2048;

/// Input payload for a bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapClusterInput {
    /// Validated positionals.
    pub descriptor: ClusterDescriptor,
    /// Directory holding the helper scripts, `pem/` and `conf/`.
    pub workdir: PathBuf,
    /// Validated pipeline configuration.
    pub config: ValidatedBootstrapConfig,
}

/// Dependencies required by the bootstrap pipeline.
#[derive(Clone)]
pub struct BootstrapClusterDeps {
    /// Runs every delegated step.
    pub commands: Arc<dyn CommandPort>,
    /// Resolves required tools.
    pub tools: Arc<dyn ToolLocatorPort>,
    /// Workspace file operations.
    pub workspace: Arc<dyn WorkspacePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Timing of one completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Pipeline step.
    pub step: BootstrapStep,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    /// Cluster tag.
    pub tag: ClusterTag,
    /// Requested node count.
    pub node_count: NodeCount,
    /// Host the ledger was initialized on.
    pub genesis_host: HostName,
    /// Completed steps, in order.
    pub steps: Vec<StepRecord>,
    /// Total wall-clock duration.
    pub duration_ms: u64,
}

/// Pipeline failures that are not plain I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// A required tool is not on `PATH`.
    MissingTool {
        /// Tool name.
        tool: String,
    },
    /// The credential file is absent.
    MissingCredential {
        /// Expected location.
        path: PathBuf,
    },
    /// A delegated command did not exit with status 0.
    StepFailed {
        /// Failing step.
        step: BootstrapStep,
        /// How the child ended.
        status: CommandStatus,
        /// Tail of the child's stderr.
        stderr_tail: String,
    },
}

impl BootstrapError {
    /// Stable error code.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingTool { .. } => ErrorCode::new("bootstrap", "missing_tool"),
            Self::MissingCredential { .. } => ErrorCode::new("bootstrap", "missing_credential"),
            Self::StepFailed { .. } => ErrorCode::new("bootstrap", "step_failed"),
        }
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTool { tool } => write!(formatter, "required tool not found on PATH: {tool}"),
            Self::MissingCredential { path } => {
                write!(formatter, "credential file not found: {}", path.display())
            },
            Self::StepFailed { step, status, .. } => {
                write!(formatter, "step {step} failed ({status})")
            },
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<BootstrapError> for ErrorEnvelope {
    fn from(error: BootstrapError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            BootstrapError::MissingTool { tool } => envelope.with_metadata("tool", tool),
            BootstrapError::MissingCredential { path } => {
                envelope.with_metadata("path", path.to_string_lossy().into_owned())
            },
            BootstrapError::StepFailed {
                step,
                status,
                stderr_tail,
            } => {
                let envelope = envelope.with_metadata("step", step.as_str());
                let envelope = match status.code() {
                    Some(code) => envelope.with_metadata(EXIT_CODE_METADATA_KEY, code.to_string()),
                    None => envelope.with_metadata("signaled", "true"),
                };
                if stderr_tail.is_empty() {
                    envelope
                } else {
                    envelope.with_metadata("stderr", stderr_tail)
                }
            },
        }
    }
}

/// Turn a non-zero exit into the uniform `step_failed` error.
pub fn ensure_success(step: BootstrapStep, output: &CommandOutput) -> Result<()> {
    if output.status.is_success() {
        return Ok(());
    }
    Err(BootstrapError::StepFailed {
        step,
        status: output.status,
        stderr_tail: stderr_tail(&output.stderr, STDERR_TAIL_BYTES),
    }
    .into())
}

fn stderr_tail(stderr: &str, limit: usize) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.len() <= limit {
        return trimmed.to_owned();
    }
    let mut start = trimmed.len() - limit;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed.get(start..).unwrap_or_default().to_owned()
}

/// Run the full pipeline for one cluster.
#[tracing::instrument(
    name = "bootstrap_cluster",
    skip_all,
    fields(
        tag = %input.descriptor.tag,
        nodes = %input.descriptor.node_count,
        correlation_id = %ctx.correlation_id().as_str(),
    )
)]
pub async fn bootstrap_cluster(
    ctx: &RequestContext,
    deps: &BootstrapClusterDeps,
    input: BootstrapClusterInput,
) -> Result<BootstrapReport> {
    let started_at = Instant::now();
    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "bootstrap.start",
            "Cluster bootstrap started",
            Some(log_fields_start(&input)),
        );
    }

    let mut pipeline = Pipeline {
        ctx,
        deps,
        input: &input,
        records: Vec::new(),
    };
    let result = pipeline.run().await;

    match result {
        Ok(genesis_host) => {
            let report = BootstrapReport {
                tag: input.descriptor.tag.clone(),
                node_count: input.descriptor.node_count.clone(),
                genesis_host,
                steps: pipeline.records,
                duration_ms: duration_ms(started_at),
            };
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    "bootstrap.completed",
                    "Cluster bootstrap completed",
                    Some(log_fields_completed(&report)),
                );
            }
            Ok(report)
        },
        Err(error) => {
            if let Some(logger) = deps.logger.as_ref() {
                let fields = log_fields_error(duration_ms(started_at), &error);
                if error.is_cancelled() {
                    logger.warn("bootstrap.aborted", "Cluster bootstrap aborted", Some(fields));
                } else {
                    logger.error("bootstrap.failed", "Cluster bootstrap failed", Some(fields));
                }
            }
            Err(error)
        },
    }
}

struct Pipeline<'a> {
    ctx: &'a RequestContext,
    deps: &'a BootstrapClusterDeps,
    input: &'a BootstrapClusterInput,
    records: Vec<StepRecord>,
}

impl Pipeline<'_> {
    async fn run(&mut self) -> Result<HostName> {
        let (ctx, deps, input) = (self.ctx, self.deps, self.input);
        let config = input.config.as_ref();
        let workdir = input.workdir.as_path();

        self.timed(BootstrapStep::CheckTools, async {
            check_tools(deps, config.tools.names())
        })
        .await?;
        let credential = workdir.join(&config.paths.credential_file);
        self.timed(
            BootstrapStep::CheckCredentials,
            check_credentials(ctx, deps, credential),
        )
        .await?;

        for step in [
            BootstrapStep::Provision,
            BootstrapStep::WaitUntilRunning,
            BootstrapStep::ResolveAddresses,
            BootstrapStep::RenderHostList,
        ] {
            let timeout = (step == BootstrapStep::WaitUntilRunning)
                .then(|| input.config.readiness_timeout())
                .flatten();
            self.delegate(step, &[], timeout).await?;
        }

        let script = workdir.join(&config.paths.known_hosts_script);
        self.timed(
            BootstrapStep::RegisterHosts,
            register_hosts(ctx, deps, workdir, script),
        )
        .await?;

        self.timed(
            BootstrapStep::AssembleStorageConfig,
            assemble_storage_config(
                ctx,
                deps,
                workdir.join(&config.paths.config_template),
                workdir.join(&config.paths.config_fragment),
                workdir.join(&config.paths.config_file),
            ),
        )
        .await?;

        for step in [
            BootstrapStep::InstallBaseSoftware,
            BootstrapStep::InstallStorageBackend,
            BootstrapStep::InstallApplication,
        ] {
            self.delegate(step, &[], None).await?;
        }

        let config_text = deps
            .workspace
            .read_text(ctx, workdir.join(&config.paths.config_file))
            .await?;
        let host = genesis_host(&config_text).map_err(ErrorEnvelope::from)?;
        if let Some(logger) = deps.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("genesisHost".into(), Value::from(host.as_str()));
            logger.info("bootstrap.genesis.resolved", "Genesis host resolved", Some(fields));
        }
        self.delegate(
            BootstrapStep::InitializeGenesis,
            &[(SLOT_HOST, host.as_str())],
            None,
        )
        .await?;
        self.delegate(BootstrapStep::StartCluster, &[], None).await?;

        self.timed(
            BootstrapStep::Cleanup,
            cleanup(ctx, deps, transient_files(config, workdir)),
        )
        .await?;

        Ok(host)
    }

    async fn delegate(
        &mut self,
        step: BootstrapStep,
        extra: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<()> {
        let argv = self.command_argv(step, extra)?;
        let spec = CommandSpec::from_argv(step.as_str(), argv)
            .ok_or_else(|| empty_command(step))?
            .current_dir(&self.input.workdir);
        let (ctx, deps) = (self.ctx, self.deps);
        self.timed(step, async move {
            let output =
                timeout_with_context(ctx, timeout, step.as_str(), deps.commands.run(ctx, spec))
                    .await?;
            ensure_success(step, &output)
        })
        .await
    }

    fn command_argv(&self, step: BootstrapStep, extra: &[(&str, &str)]) -> Result<Vec<String>> {
        let template =
            command_template(self.input.config.as_ref(), step).ok_or_else(|| empty_command(step))?;
        let mut bindings = descriptor_bindings(&self.input.descriptor).to_vec();
        bindings.extend_from_slice(extra);
        Ok(render_args(template, &bindings))
    }

    async fn timed<T, F>(&mut self, step: BootstrapStep, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.ctx.ensure_not_cancelled(step.as_str())?;
        let logger = self.deps.logger.as_ref();
        if let Some(logger) = logger {
            logger.info("bootstrap.step.start", "Step started", Some(step_fields(step)));
        }

        let started_at = Instant::now();
        let result = work.await;
        let elapsed = duration_ms(started_at);

        match &result {
            Ok(_) => {
                self.records.push(StepRecord {
                    step,
                    duration_ms: elapsed,
                });
                if let Some(logger) = logger {
                    let mut fields = step_fields(step);
                    fields.insert("durationMs".into(), Value::from(elapsed));
                    logger.info("bootstrap.step.completed", "Step completed", Some(fields));
                }
            },
            Err(error) => {
                if let Some(logger) = logger {
                    let mut fields = log_fields_error(elapsed, error);
                    fields.insert("step".into(), Value::from(step.as_str()));
                    logger.error("bootstrap.step.failed", "Step failed", Some(fields));
                }
            },
        }
        result
    }
}

fn check_tools(deps: &BootstrapClusterDeps, tools: [&str; 2]) -> Result<()> {
    for tool in tools {
        let Some(path) = deps.tools.locate(tool) else {
            return Err(BootstrapError::MissingTool {
                tool: tool.to_owned(),
            }
            .into());
        };
        tracing::debug!(tool, path = %path.display(), "tool resolved");
    }
    Ok(())
}

async fn check_credentials(
    ctx: &RequestContext,
    deps: &BootstrapClusterDeps,
    credential: PathBuf,
) -> Result<()> {
    if !deps.workspace.exists(ctx, credential.clone()).await? {
        return Err(BootstrapError::MissingCredential { path: credential }.into());
    }
    deps.workspace
        .set_permissions(ctx, credential, PermissionChange::OwnerReadOnly)
        .await
}

async fn register_hosts(
    ctx: &RequestContext,
    deps: &BootstrapClusterDeps,
    workdir: &Path,
    script: PathBuf,
) -> Result<()> {
    deps.workspace
        .set_permissions(ctx, script.clone(), PermissionChange::AddExecutable)
        .await?;
    let spec = CommandSpec::new(
        BootstrapStep::RegisterHosts.as_str(),
        script.to_string_lossy().into_owned(),
    )
    .current_dir(workdir);
    let output = deps.commands.run(ctx, spec).await?;
    ensure_success(BootstrapStep::RegisterHosts, &output)
}

async fn assemble_storage_config(
    ctx: &RequestContext,
    deps: &BootstrapClusterDeps,
    template: PathBuf,
    fragment: PathBuf,
    target: PathBuf,
) -> Result<()> {
    deps.workspace
        .copy_file(ctx, template, target.clone())
        .await?;
    deps.workspace.append_file(ctx, fragment, target).await
}

async fn cleanup(
    ctx: &RequestContext,
    deps: &BootstrapClusterDeps,
    paths: Vec<PathBuf>,
) -> Result<()> {
    for path in paths {
        deps.workspace.remove_file(ctx, path).await?;
    }
    Ok(())
}

fn empty_command(step: BootstrapStep) -> ErrorEnvelope {
    ErrorEnvelope::invariant(
        ErrorCode::new("bootstrap", "empty_command"),
        format!("no command configured for step {step}"),
    )
    .with_metadata("step", step.as_str())
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn step_fields(step: BootstrapStep) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("step".into(), Value::from(step.as_str()));
    fields
}

fn log_fields_start(input: &BootstrapClusterInput) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("tag".into(), Value::from(input.descriptor.tag.as_str()));
    fields.insert(
        "nodeCount".into(),
        Value::from(input.descriptor.node_count.as_str()),
    );
    fields.insert(
        "workdir".into(),
        Value::String(input.workdir.to_string_lossy().into_owned()),
    );
    fields
}

fn log_fields_completed(report: &BootstrapReport) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("tag".into(), Value::from(report.tag.as_str()));
    fields.insert("genesisHost".into(), Value::from(report.genesis_host.as_str()));
    fields.insert("steps".into(), Value::from(report.steps.len()));
    fields.insert("durationMs".into(), Value::from(report.duration_ms));
    fields
}

fn log_fields_error(duration_ms: u64, error: &ErrorEnvelope) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("durationMs".into(), Value::from(duration_ms));
    fields.insert("errorCode".into(), Value::String(error.code.to_string()));
    fields.insert("error".into(), Value::String(error.message.clone()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_success_reports_exit_code_and_stderr() {
        let mut output = CommandOutput::with_status(CommandStatus::Exited(5));
        output.stderr = "boom\n".into();

        let error = ensure_success(BootstrapStep::Provision, &output).err();
        assert!(matches!(
            error,
            Some(ref envelope)
                if envelope.code == ErrorCode::new("bootstrap", "step_failed")
                    && envelope.exit_code() == Some(5)
                    && envelope.metadata.get("step").map(String::as_str) == Some("provision")
                    && envelope.metadata.get("stderr").map(String::as_str) == Some("boom")
        ));
        assert!(ensure_success(BootstrapStep::Provision, &CommandOutput::success()).is_ok());
    }

    #[test]
    fn signaled_children_carry_no_exit_code() {
        let output = CommandOutput::with_status(CommandStatus::Signaled);
        let error = ensure_success(BootstrapStep::StartCluster, &output).err();
        assert!(matches!(
            error,
            Some(ref envelope)
                if envelope.exit_code().is_none()
                    && envelope.metadata.get("signaled").map(String::as_str) == Some("true")
        ));
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        assert_eq!(stderr_tail("abcdef\n", 3), "def");
        assert_eq!(stderr_tail("short", 64), "short");
        assert_eq!(stderr_tail("ééé", 3), "é");
    }
}
