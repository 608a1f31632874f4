//! Proxy entrypoint environment contract.
//!
//! The reverse-proxy template carries one placeholder per variable below; the
//! placeholder text is the variable name itself. All nine are required.

use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Public port the cluster frontend listens on.
pub const ENV_CLUSTER_FRONTEND_PORT: &str = "CLUSTER_FRONTEND_PORT";
/// DNS resolver used by the proxy for upstream lookups.
pub const ENV_DNS_SERVER: &str = "DNS_SERVER";
/// Port answering load-balancer health checks.
pub const ENV_HEALTH_CHECK_PORT: &str = "HEALTH_CHECK_PORT";
/// Public port forwarded to the storage backend.
pub const ENV_MONGODB_FRONTEND_PORT: &str = "MONGODB_FRONTEND_PORT";
/// Storage backend host.
pub const ENV_MONGODB_BACKEND_HOST: &str = "MONGODB_BACKEND_HOST";
/// Storage backend port.
pub const ENV_MONGODB_BACKEND_PORT: &str = "MONGODB_BACKEND_PORT";
/// Ledger application host.
pub const ENV_BIGCHAINDB_BACKEND_HOST: &str = "BIGCHAINDB_BACKEND_HOST";
/// Ledger HTTP API port.
pub const ENV_BIGCHAINDB_API_PORT: &str = "BIGCHAINDB_API_PORT";
/// Ledger event-stream (websocket) port.
pub const ENV_BIGCHAINDB_WS_PORT: &str = "BIGCHAINDB_WS_PORT";

/// Required variables in substitution order.
pub const PROXY_ENV_VARS: [&str; 9] = [
    ENV_CLUSTER_FRONTEND_PORT,
    ENV_DNS_SERVER,
    ENV_HEALTH_CHECK_PORT,
    ENV_MONGODB_FRONTEND_PORT,
    ENV_MONGODB_BACKEND_HOST,
    ENV_MONGODB_BACKEND_PORT,
    ENV_BIGCHAINDB_BACKEND_HOST,
    ENV_BIGCHAINDB_API_PORT,
    ENV_BIGCHAINDB_WS_PORT,
];

/// Validated proxy environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEnv {
    /// `CLUSTER_FRONTEND_PORT`.
    pub cluster_frontend_port: Box<str>,
    /// `DNS_SERVER`.
    pub dns_server: Box<str>,
    /// `HEALTH_CHECK_PORT`.
    pub health_check_port: Box<str>,
    /// `MONGODB_FRONTEND_PORT`.
    pub mongodb_frontend_port: Box<str>,
    /// `MONGODB_BACKEND_HOST`.
    pub mongodb_backend_host: Box<str>,
    /// `MONGODB_BACKEND_PORT`.
    pub mongodb_backend_port: Box<str>,
    /// `BIGCHAINDB_BACKEND_HOST`.
    pub bigchaindb_backend_host: Box<str>,
    /// `BIGCHAINDB_API_PORT`.
    pub bigchaindb_api_port: Box<str>,
    /// `BIGCHAINDB_WS_PORT`.
    pub bigchaindb_ws_port: Box<str>,
}

impl ProxyEnv {
    /// Parse from an explicit variable map.
    ///
    /// Every variable is checked before failing, so the error names all
    /// missing or empty variables at once. Whitespace-only values count as
    /// present and are kept verbatim.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        let missing: Vec<&'static str> = PROXY_ENV_VARS
            .iter()
            .copied()
            .filter(|name| map.get(*name).is_none_or(String::is_empty))
            .collect();
        if !missing.is_empty() {
            return Err(EnvParseError::MissingRequired { vars: missing });
        }

        let take = |name: &'static str| -> Box<str> {
            map.get(name).map(String::as_str).unwrap_or_default().into()
        };

        Ok(Self {
            cluster_frontend_port: take(ENV_CLUSTER_FRONTEND_PORT),
            dns_server: take(ENV_DNS_SERVER),
            health_check_port: take(ENV_HEALTH_CHECK_PORT),
            mongodb_frontend_port: take(ENV_MONGODB_FRONTEND_PORT),
            mongodb_backend_host: take(ENV_MONGODB_BACKEND_HOST),
            mongodb_backend_port: take(ENV_MONGODB_BACKEND_PORT),
            bigchaindb_backend_host: take(ENV_BIGCHAINDB_BACKEND_HOST),
            bigchaindb_api_port: take(ENV_BIGCHAINDB_API_PORT),
            bigchaindb_ws_port: take(ENV_BIGCHAINDB_WS_PORT),
        })
    }

    /// `(placeholder, value)` pairs in substitution order.
    #[must_use]
    pub fn substitutions(&self) -> [(&'static str, &str); 9] {
        [
            (ENV_CLUSTER_FRONTEND_PORT, &*self.cluster_frontend_port),
            (ENV_DNS_SERVER, &*self.dns_server),
            (ENV_HEALTH_CHECK_PORT, &*self.health_check_port),
            (ENV_MONGODB_FRONTEND_PORT, &*self.mongodb_frontend_port),
            (ENV_MONGODB_BACKEND_HOST, &*self.mongodb_backend_host),
            (ENV_MONGODB_BACKEND_PORT, &*self.mongodb_backend_port),
            (ENV_BIGCHAINDB_BACKEND_HOST, &*self.bigchaindb_backend_host),
            (ENV_BIGCHAINDB_API_PORT, &*self.bigchaindb_api_port),
            (ENV_BIGCHAINDB_WS_PORT, &*self.bigchaindb_ws_port),
        ]
    }
}

/// Environment parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// Required variables are unset or set to the empty string.
    MissingRequired {
        /// Offending variable names, in declaration order.
        vars: Vec<&'static str>,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingRequired { .. } => ErrorCode::new("config", "missing_env_var"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { vars } => write!(
                formatter,
                "required environment variables are missing or empty: {}",
                vars.join(", ")
            ),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::MissingRequired { vars } => {
                envelope.with_metadata("env_vars", vars.join(","))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn full_map() -> BTreeMap<String, String> {
        PROXY_ENV_VARS
            .iter()
            .enumerate()
            .map(|(index, name)| ((*name).to_owned(), format!("value-{index}")))
            .collect()
    }

    #[test]
    fn parses_complete_environment() -> Result<(), Box<dyn Error>> {
        let env = ProxyEnv::from_map(&full_map())?;
        assert_eq!(env.cluster_frontend_port.as_ref(), "value-0");
        assert_eq!(env.bigchaindb_ws_port.as_ref(), "value-8");
        let tokens: Vec<&str> = env.substitutions().iter().map(|(token, _)| *token).collect();
        assert_eq!(tokens, PROXY_ENV_VARS);
        Ok(())
    }

    #[test]
    fn reports_every_missing_or_empty_var() {
        let mut map = full_map();
        map.remove(ENV_DNS_SERVER);
        map.insert(ENV_BIGCHAINDB_API_PORT.to_owned(), String::new());

        let error = ProxyEnv::from_map(&map).err();
        assert_eq!(
            error,
            Some(EnvParseError::MissingRequired {
                vars: vec![ENV_DNS_SERVER, ENV_BIGCHAINDB_API_PORT],
            })
        );
    }

    #[test]
    fn each_single_omission_fails() {
        for name in PROXY_ENV_VARS {
            let mut map = full_map();
            map.remove(name);
            assert!(
                ProxyEnv::from_map(&map).is_err(),
                "omitting {name} should fail"
            );
        }
    }

    #[test]
    fn values_are_kept_verbatim() -> Result<(), Box<dyn Error>> {
        let mut map = full_map();
        map.insert(ENV_DNS_SERVER.to_owned(), " 127.0.0.11".to_owned());
        let env = ProxyEnv::from_map(&map)?;
        assert_eq!(env.dns_server.as_ref(), " 127.0.0.11");
        Ok(())
    }

    #[test]
    fn whitespace_only_value_counts_as_present() -> Result<(), Box<dyn Error>> {
        let mut map = full_map();
        map.insert(ENV_DNS_SERVER.to_owned(), " ".to_owned());
        let env = ProxyEnv::from_map(&map)?;
        assert_eq!(env.dns_server.as_ref(), " ");
        Ok(())
    }

    #[test]
    fn error_maps_into_envelope() {
        let envelope: ErrorEnvelope = EnvParseError::MissingRequired {
            vars: vec![ENV_HEALTH_CHECK_PORT],
        }
        .into();
        assert_eq!(envelope.code, ErrorCode::new("config", "missing_env_var"));
        assert_eq!(
            envelope.metadata.get("env_vars").map(String::as_str),
            Some("HEALTH_CHECK_PORT")
        );
    }
}
