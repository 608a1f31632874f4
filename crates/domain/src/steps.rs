//! Bootstrap step catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of the cluster bootstrap pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapStep {
    /// Both positionals present.
    ValidateArguments,
    /// Cloud CLI and orchestrator resolvable on `PATH`.
    CheckTools,
    /// Credential file present and locked down to owner-read.
    CheckCredentials,
    /// Launch and tag instances.
    Provision,
    /// Block until instances report running.
    WaitUntilRunning,
    /// Allocate and associate public addresses.
    ResolveAddresses,
    /// Emit the registration script, config fragment and host list.
    RenderHostList,
    /// Run the host-registration script.
    RegisterHosts,
    /// Copy the config template and append the fragment.
    AssembleStorageConfig,
    /// Install base packages on every node.
    InstallBaseSoftware,
    /// Install the storage backend on every node.
    InstallStorageBackend,
    /// Install the ledger application on every node.
    InstallApplication,
    /// Initialize the ledger on the genesis host.
    InitializeGenesis,
    /// Start the ledger on every node.
    StartCluster,
    /// Delete the transient files.
    Cleanup,
}

impl BootstrapStep {
    /// Every step, in execution order.
    pub const ALL: [Self; 15] = [
        Self::ValidateArguments,
        Self::CheckTools,
        Self::CheckCredentials,
        Self::Provision,
        Self::WaitUntilRunning,
        Self::ResolveAddresses,
        Self::RenderHostList,
        Self::RegisterHosts,
        Self::AssembleStorageConfig,
        Self::InstallBaseSoftware,
        Self::InstallStorageBackend,
        Self::InstallApplication,
        Self::InitializeGenesis,
        Self::StartCluster,
        Self::Cleanup,
    ];

    /// Stable kebab-case name used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidateArguments => "validate-arguments",
            Self::CheckTools => "check-tools",
            Self::CheckCredentials => "check-credentials",
            Self::Provision => "provision",
            Self::WaitUntilRunning => "wait-until-running",
            Self::ResolveAddresses => "resolve-addresses",
            Self::RenderHostList => "render-host-list",
            Self::RegisterHosts => "register-hosts",
            Self::AssembleStorageConfig => "assemble-storage-config",
            Self::InstallBaseSoftware => "install-base-software",
            Self::InstallStorageBackend => "install-storage-backend",
            Self::InstallApplication => "install-application",
            Self::InitializeGenesis => "initialize-genesis",
            Self::StartCluster => "start-cluster",
            Self::Cleanup => "cleanup",
        }
    }

    /// True when the step is carried out by an external command.
    #[must_use]
    pub const fn is_delegated(self) -> bool {
        matches!(
            self,
            Self::Provision
                | Self::WaitUntilRunning
                | Self::ResolveAddresses
                | Self::RenderHostList
                | Self::RegisterHosts
                | Self::InstallBaseSoftware
                | Self::InstallStorageBackend
                | Self::InstallApplication
                | Self::InitializeGenesis
                | Self::StartCluster
        )
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_ordered() {
        let mut sorted = BootstrapStep::ALL;
        sorted.sort();
        assert_eq!(sorted, BootstrapStep::ALL);
        assert_eq!(BootstrapStep::ALL.first(), Some(&BootstrapStep::ValidateArguments));
        assert_eq!(BootstrapStep::ALL.last(), Some(&BootstrapStep::Cleanup));
    }

    #[test]
    fn serde_name_matches_display() -> Result<(), serde_json::Error> {
        for step in BootstrapStep::ALL {
            let encoded = serde_json::to_string(&step)?;
            assert_eq!(encoded, format!("\"{step}\""));
        }
        Ok(())
    }

    #[test]
    fn local_steps_are_not_delegated() {
        assert!(!BootstrapStep::CheckCredentials.is_delegated());
        assert!(!BootstrapStep::AssembleStorageConfig.is_delegated());
        assert!(BootstrapStep::InitializeGenesis.is_delegated());
    }
}
