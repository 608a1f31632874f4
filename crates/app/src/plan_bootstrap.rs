//! Side-effect-free rendering of the bootstrap pipeline.
//!
//! The plan lists every step with the concrete argv it would run. The
//! genesis host is only known after the storage config is assembled, so the
//! `{host}` slot is left as-is.

use ledger_ops_config::{BootstrapConfig, SLOT_NODES, SLOT_TAG, ValidatedBootstrapConfig};
use ledger_ops_domain::{BootstrapStep, ClusterDescriptor, render_args};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PlannedAction {
    /// Positionals accepted.
    ValidateArguments {
        /// Cluster tag.
        tag: String,
        /// Node count, verbatim.
        nodes: String,
    },
    /// Tools looked up on `PATH`.
    CheckTools {
        /// Tool names in check order.
        tools: Vec<String>,
    },
    /// Credential must exist; mode set to `0400`.
    CheckCredential {
        /// Credential path.
        path: PathBuf,
    },
    /// External command.
    Run {
        /// Program and arguments.
        argv: Vec<String>,
    },
    /// Generated script made executable, then run.
    RunScript {
        /// Script path.
        script: PathBuf,
    },
    /// Template copied to the target, fragment appended.
    AssembleConfig {
        /// Template path.
        template: PathBuf,
        /// Fragment path.
        fragment: PathBuf,
        /// Assembled config path.
        target: PathBuf,
    },
    /// Files deleted.
    RemoveFiles {
        /// Paths to delete.
        paths: Vec<PathBuf>,
    },
}

/// One step of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    /// Pipeline step.
    pub step: BootstrapStep,
    /// Action taken.
    pub action: PlannedAction,
}

/// Full bootstrap plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapPlan {
    /// Working directory every step runs in.
    pub workdir: PathBuf,
    /// Steps in execution order.
    pub steps: Vec<PlannedStep>,
}

/// Render the plan for `descriptor` without touching anything.
pub fn plan_bootstrap(
    descriptor: &ClusterDescriptor,
    config: &ValidatedBootstrapConfig,
    workdir: &Path,
) -> BootstrapPlan {
    let raw = config.as_ref();
    let bindings = descriptor_bindings(descriptor);
    let steps = BootstrapStep::ALL
        .into_iter()
        .map(|step| PlannedStep {
            step,
            action: planned_action(step, descriptor, raw, &bindings, workdir),
        })
        .collect();

    BootstrapPlan {
        workdir: workdir.to_path_buf(),
        steps,
    }
}

fn planned_action(
    step: BootstrapStep,
    descriptor: &ClusterDescriptor,
    config: &BootstrapConfig,
    bindings: &[(&str, &str)],
    workdir: &Path,
) -> PlannedAction {
    let paths = &config.paths;
    match step {
        BootstrapStep::ValidateArguments => PlannedAction::ValidateArguments {
            tag: descriptor.tag.as_str().to_owned(),
            nodes: descriptor.node_count.as_str().to_owned(),
        },
        BootstrapStep::CheckTools => PlannedAction::CheckTools {
            tools: config.tools.names().map(str::to_owned).to_vec(),
        },
        BootstrapStep::CheckCredentials => PlannedAction::CheckCredential {
            path: workdir.join(&paths.credential_file),
        },
        BootstrapStep::RegisterHosts => PlannedAction::RunScript {
            script: workdir.join(&paths.known_hosts_script),
        },
        BootstrapStep::AssembleStorageConfig => PlannedAction::AssembleConfig {
            template: workdir.join(&paths.config_template),
            fragment: workdir.join(&paths.config_fragment),
            target: workdir.join(&paths.config_file),
        },
        BootstrapStep::Cleanup => PlannedAction::RemoveFiles {
            paths: transient_files(config, workdir),
        },
        other => PlannedAction::Run {
            argv: command_template(config, other)
                .map(|argv| render_args(argv, bindings))
                .unwrap_or_default(),
        },
    }
}

/// `{tag}` and `{nodes}` bindings for a descriptor.
pub(crate) fn descriptor_bindings(descriptor: &ClusterDescriptor) -> [(&str, &str); 2] {
    [
        (SLOT_TAG, descriptor.tag.as_str()),
        (SLOT_NODES, descriptor.node_count.as_str()),
    ]
}

/// Configured argv for steps that run a configured command.
pub(crate) fn command_template(config: &BootstrapConfig, step: BootstrapStep) -> Option<&[String]> {
    let argv = match step {
        BootstrapStep::Provision => &config.helpers.provision,
        BootstrapStep::WaitUntilRunning => &config.helpers.wait_until_running,
        BootstrapStep::ResolveAddresses => &config.helpers.resolve_addresses,
        BootstrapStep::RenderHostList => &config.helpers.render_host_list,
        BootstrapStep::InstallBaseSoftware => &config.phases.install_base_software,
        BootstrapStep::InstallStorageBackend => &config.phases.install_storage_backend,
        BootstrapStep::InstallApplication => &config.phases.install_application,
        BootstrapStep::InitializeGenesis => &config.phases.initialize_genesis,
        BootstrapStep::StartCluster => &config.phases.start_cluster,
        BootstrapStep::ValidateArguments
        | BootstrapStep::CheckTools
        | BootstrapStep::CheckCredentials
        | BootstrapStep::RegisterHosts
        | BootstrapStep::AssembleStorageConfig
        | BootstrapStep::Cleanup => return None,
    };
    Some(argv.as_slice())
}

/// Files deleted by the cleanup step.
pub(crate) fn transient_files(config: &BootstrapConfig, workdir: &Path) -> Vec<PathBuf> {
    vec![
        workdir.join(&config.paths.known_hosts_script),
        workdir.join(&config.paths.config_fragment),
    ]
}
