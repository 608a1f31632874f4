//! Cluster bootstrap configuration schema.
//!
//! Defaults reproduce the stock AWS deployment layout, so a bare
//! `ledger-ops bootstrap <TAG> <NUM_NODES>` needs no config file. Argv entries
//! may use the `{tag}`, `{nodes}` and `{host}` slots.

use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Slot filled with the cluster tag.
pub const SLOT_TAG: &str = "tag";
/// Slot filled with the node count.
pub const SLOT_NODES: &str = "nodes";
/// Slot filled with the genesis host.
pub const SLOT_HOST: &str = "host";

/// Root bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BootstrapConfig {
    /// Files the pipeline reads, writes or deletes.
    pub paths: BootstrapPaths,
    /// Tools that must resolve on `PATH` before anything runs.
    pub tools: RequiredTools,
    /// Provisioning helpers (cloud side).
    pub helpers: ProvisioningHelpers,
    /// Orchestrator phases (node side).
    pub phases: OrchestrationPhases,
    /// Upper bound for the wait-until-running step; unset waits forever.
    pub readiness_timeout_secs: Option<u64>,
}

/// Workspace-relative file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BootstrapPaths {
    /// SSH private key for the cluster nodes.
    pub credential_file: PathBuf,
    /// Storage-backend config template.
    pub config_template: PathBuf,
    /// Assembled storage-backend config.
    pub config_file: PathBuf,
    /// Generated host-registration script (transient).
    pub known_hosts_script: PathBuf,
    /// Generated config fragment (transient).
    pub config_fragment: PathBuf,
    /// Generated host list consumed by the orchestrator.
    pub host_list: PathBuf,
}

impl Default for BootstrapPaths {
    fn default() -> Self {
        Self {
            credential_file: PathBuf::from("pem/bigchaindb.pem"),
            config_template: PathBuf::from("conf/rethinkdb.conf.template"),
            config_file: PathBuf::from("conf/rethinkdb.conf"),
            known_hosts_script: PathBuf::from("add2known_hosts.sh"),
            config_fragment: PathBuf::from("add2dbconf"),
            host_list: PathBuf::from("hostlist.py"),
        }
    }
}

/// Tool names checked on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RequiredTools {
    /// Cloud provider CLI.
    pub cloud_cli: String,
    /// Remote orchestration tool.
    pub orchestrator: String,
}

impl Default for RequiredTools {
    fn default() -> Self {
        Self {
            cloud_cli: "aws".to_owned(),
            orchestrator: "fab".to_owned(),
        }
    }
}

impl RequiredTools {
    /// Tool names in check order.
    #[must_use]
    pub fn names(&self) -> [&str; 2] {
        [self.cloud_cli.as_str(), self.orchestrator.as_str()]
    }
}

/// Cloud-side helper commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProvisioningHelpers {
    /// Launch and tag instances.
    pub provision: Vec<String>,
    /// Block until every tagged instance is running.
    pub wait_until_running: Vec<String>,
    /// Allocate and associate public addresses.
    pub resolve_addresses: Vec<String>,
    /// Emit the registration script, config fragment and host list.
    pub render_host_list: Vec<String>,
}

impl Default for ProvisioningHelpers {
    fn default() -> Self {
        Self {
            provision: argv(&["python", "run_and_tag.py", "--tag", "{tag}", "--nodes", "{nodes}"]),
            wait_until_running: argv(&["python", "wait_until_running.py", "--tag", "{tag}"]),
            resolve_addresses: argv(&["python", "get_elastic_ips.py", "--tag", "{tag}"]),
            render_host_list: argv(&["python", "create_hostlist.py", "--tag", "{tag}"]),
        }
    }
}

/// Orchestrator invocations, in run order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OrchestrationPhases {
    /// Base packages on every node.
    pub install_base_software: Vec<String>,
    /// Storage backend on every node.
    pub install_storage_backend: Vec<String>,
    /// Ledger application on every node.
    pub install_application: Vec<String>,
    /// Ledger initialization on the genesis host only.
    pub initialize_genesis: Vec<String>,
    /// Start the ledger on every node.
    pub start_cluster: Vec<String>,
}

impl Default for OrchestrationPhases {
    fn default() -> Self {
        Self {
            install_base_software: argv(&["fab", "install_base_software"]),
            install_storage_backend: argv(&["fab", "install_rethinkdb"]),
            install_application: argv(&["fab", "install_bigchaindb"]),
            initialize_genesis: argv(&[
                "fab",
                "-H",
                "{host}",
                "-f",
                "fab_prepare_chain.py",
                "init_bigchaindb",
            ]),
            start_cluster: argv(&["fab", "start_bigchaindb_nodes"]),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_owned()).collect()
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapConfigError {
    /// A command line has no program.
    EmptyCommand {
        /// Field name in the config file.
        field: &'static str,
    },
    /// A path is empty.
    EmptyPath {
        /// Field name in the config file.
        field: &'static str,
    },
    /// A tool name is blank.
    EmptyTool {
        /// Field name in the config file.
        field: &'static str,
    },
    /// The genesis command does not reference `{host}`.
    GenesisWithoutHost,
    /// The readiness timeout is zero.
    ZeroReadinessTimeout,
}

impl fmt::Display for BootstrapConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCommand { field } => write!(formatter, "{field} must name a program"),
            Self::EmptyPath { field } => write!(formatter, "{field} must be a non-empty path"),
            Self::EmptyTool { field } => write!(formatter, "{field} must be non-empty"),
            Self::GenesisWithoutHost => {
                formatter.write_str("phases.initializeGenesis must reference {host}")
            },
            Self::ZeroReadinessTimeout => {
                formatter.write_str("readinessTimeoutSecs must be greater than zero")
            },
        }
    }
}

impl std::error::Error for BootstrapConfigError {}

impl From<BootstrapConfigError> for ErrorEnvelope {
    fn from(error: BootstrapConfigError) -> Self {
        let envelope = Self::expected(
            ErrorCode::new("config", "invalid_bootstrap_config"),
            error.to_string(),
        );
        match error {
            BootstrapConfigError::EmptyCommand { field }
            | BootstrapConfigError::EmptyPath { field }
            | BootstrapConfigError::EmptyTool { field } => envelope.with_metadata("field", field),
            BootstrapConfigError::GenesisWithoutHost => {
                envelope.with_metadata("field", "phases.initializeGenesis")
            },
            BootstrapConfigError::ZeroReadinessTimeout => {
                envelope.with_metadata("field", "readinessTimeoutSecs")
            },
        }
    }
}

impl BootstrapConfig {
    /// Validate the schema and wrap it.
    pub fn validate(self) -> Result<ValidatedBootstrapConfig, BootstrapConfigError> {
        let paths = [
            ("paths.credentialFile", &self.paths.credential_file),
            ("paths.configTemplate", &self.paths.config_template),
            ("paths.configFile", &self.paths.config_file),
            ("paths.knownHostsScript", &self.paths.known_hosts_script),
            ("paths.configFragment", &self.paths.config_fragment),
            ("paths.hostList", &self.paths.host_list),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(BootstrapConfigError::EmptyPath { field });
            }
        }

        if self.tools.cloud_cli.trim().is_empty() {
            return Err(BootstrapConfigError::EmptyTool {
                field: "tools.cloudCli",
            });
        }
        if self.tools.orchestrator.trim().is_empty() {
            return Err(BootstrapConfigError::EmptyTool {
                field: "tools.orchestrator",
            });
        }

        for (field, command) in self.commands() {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(BootstrapConfigError::EmptyCommand { field });
            }
        }

        let host_slot = format!("{{{SLOT_HOST}}}");
        if !self
            .phases
            .initialize_genesis
            .iter()
            .any(|arg| arg.contains(&host_slot))
        {
            return Err(BootstrapConfigError::GenesisWithoutHost);
        }

        if self.readiness_timeout_secs == Some(0) {
            return Err(BootstrapConfigError::ZeroReadinessTimeout);
        }

        Ok(ValidatedBootstrapConfig { raw: self })
    }

    fn commands(&self) -> [(&'static str, &[String]); 9] {
        [
            ("helpers.provision", self.helpers.provision.as_slice()),
            ("helpers.waitUntilRunning", self.helpers.wait_until_running.as_slice()),
            ("helpers.resolveAddresses", self.helpers.resolve_addresses.as_slice()),
            ("helpers.renderHostList", self.helpers.render_host_list.as_slice()),
            ("phases.installBaseSoftware", self.phases.install_base_software.as_slice()),
            ("phases.installStorageBackend", self.phases.install_storage_backend.as_slice()),
            ("phases.installApplication", self.phases.install_application.as_slice()),
            ("phases.initializeGenesis", self.phases.initialize_genesis.as_slice()),
            ("phases.startCluster", self.phases.start_cluster.as_slice()),
        ]
    }
}

/// Bootstrap config that passed [`BootstrapConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBootstrapConfig {
    raw: BootstrapConfig,
}

impl ValidatedBootstrapConfig {
    /// Validated built-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            raw: BootstrapConfig::default(),
        }
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &BootstrapConfig {
        &self.raw
    }

    /// Readiness timeout as a duration.
    #[must_use]
    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.raw.readiness_timeout_secs.map(Duration::from_secs)
    }
}

/// Parse and validate a bootstrap config from TOML.
pub fn parse_bootstrap_config_toml(input: &str) -> Result<ValidatedBootstrapConfig, ErrorEnvelope> {
    let config: BootstrapConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid bootstrap config TOML: {error}"),
        )
    })?;

    config.validate().map_err(Into::into)
}
