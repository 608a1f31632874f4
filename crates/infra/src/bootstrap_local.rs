//! Local wiring for the cluster bootstrap pipeline.

use crate::observability::{logger_from_env, scope_logger};
use crate::runtime::run_with_interrupt;
use crate::{InfraError, InfraResult, process_env};
use ledger_ops_adapters::{LocalWorkspace, PathToolLocator, TokioCommandRunner};
use ledger_ops_app::{
    BootstrapClusterDeps, BootstrapClusterInput, BootstrapPlan, BootstrapReport,
    STDERR_TAIL_BYTES, bootstrap_cluster, plan_bootstrap,
};
use ledger_ops_config::{ValidatedBootstrapConfig, load_bootstrap_config};
use ledger_ops_domain::ClusterDescriptor;
use ledger_ops_shared::RequestContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Captured bytes kept per child stream. Only the stderr tail is reported, so
/// a few multiples of it is enough to survive long final lines.
const CHILD_CAPTURE_BYTES: usize = 8 * STDERR_TAIL_BYTES;

/// Raw bootstrap arguments as received from the command line.
#[derive(Debug, Clone, Default)]
pub struct BootstrapLocalArgs {
    /// Cluster tag positional.
    pub tag: Option<String>,
    /// Node count positional.
    pub node_count: Option<String>,
    /// Optional TOML override file.
    pub config_path: Option<PathBuf>,
    /// Directory holding the helper scripts; relative paths resolve against
    /// the current directory.
    pub workdir: PathBuf,
}

struct Prepared {
    descriptor: ClusterDescriptor,
    config: ValidatedBootstrapConfig,
    workdir: PathBuf,
}

/// Run the full bootstrap pipeline against real tools.
pub fn run_bootstrap_local(args: &BootstrapLocalArgs) -> InfraResult<BootstrapReport> {
    let prepared = prepare(args)?;
    let env = process_env();
    let logger = logger_from_env(&env);
    let ctx = RequestContext::new_run();
    let deps = BootstrapClusterDeps {
        commands: Arc::new(TokioCommandRunner::new().with_capture_limit(CHILD_CAPTURE_BYTES)),
        tools: Arc::new(PathToolLocator::from_env()),
        workspace: Arc::new(LocalWorkspace::new()),
        logger: Some(scope_logger(logger.as_ref(), &ctx)),
    };
    let input = BootstrapClusterInput {
        descriptor: prepared.descriptor,
        workdir: prepared.workdir,
        config: prepared.config,
    };

    run_with_interrupt(ctx, |ctx| async move {
        bootstrap_cluster(&ctx, &deps, input).await
    })
}

/// Render the step plan without touching anything.
pub fn plan_bootstrap_local(args: &BootstrapLocalArgs) -> InfraResult<BootstrapPlan> {
    let prepared = prepare(args)?;
    Ok(plan_bootstrap(
        &prepared.descriptor,
        &prepared.config,
        &prepared.workdir,
    ))
}

fn prepare(args: &BootstrapLocalArgs) -> InfraResult<Prepared> {
    let descriptor = ClusterDescriptor::from_args(args.tag.as_deref(), args.node_count.as_deref())
        .map_err(InfraError::from)?;
    let config = load_bootstrap_config(args.config_path.as_deref())?;
    let workdir = absolute_workdir(&args.workdir)?;
    Ok(Prepared {
        descriptor,
        config,
        workdir,
    })
}

fn absolute_workdir(workdir: &Path) -> InfraResult<PathBuf> {
    let target = if workdir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        workdir
    };
    std::path::absolute(target).map_err(|error| {
        InfraError::from(error).with_metadata("path", target.to_string_lossy().into_owned())
    })
}
