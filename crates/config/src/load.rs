//! Config loading helpers (defaults + optional file).

use crate::{ValidatedBootstrapConfig, parse_bootstrap_config_toml};
use ledger_ops_shared::{ErrorCode, ErrorEnvelope};
use std::path::Path;

/// Load the bootstrap config.
///
/// Without a path the validated built-in defaults are returned. Fields absent
/// from the file keep their defaults.
pub fn load_bootstrap_config(
    config_path: Option<&Path>,
) -> Result<ValidatedBootstrapConfig, ErrorEnvelope> {
    let Some(path) = config_path else {
        tracing::debug!("bootstrap config: using built-in defaults");
        return Ok(ValidatedBootstrapConfig::defaults());
    };

    let config_text = read_config_file(path)?;
    let config = parse_bootstrap_config_toml(&config_text)
        .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?;
    tracing::debug!(path = %path.display(), "bootstrap config loaded");
    Ok(config)
}

/// Serialize a config as pretty TOML.
pub fn to_pretty_toml(config: &ValidatedBootstrapConfig) -> Result<String, ErrorEnvelope> {
    toml::to_string_pretty(config.as_ref()).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize bootstrap config: {error}"),
        )
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn missing_path_yields_defaults() -> Result<(), Box<dyn Error>> {
        let config = load_bootstrap_config(None)?;
        assert_eq!(config, ValidatedBootstrapConfig::defaults());
        Ok(())
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let error = load_bootstrap_config(Some(Path::new("/nonexistent/ledger-ops.toml"))).err();
        assert!(matches!(
            error,
            Some(ref envelope)
                if envelope.code == ErrorCode::new("config", "config_file_not_found")
                    && envelope.metadata.contains_key("path")
        ));
    }

    #[test]
    fn pretty_toml_parses_back() -> Result<(), Box<dyn Error>> {
        let defaults = ValidatedBootstrapConfig::defaults();
        let text = to_pretty_toml(&defaults)?;
        assert!(text.contains("credentialFile = \"pem/bigchaindb.pem\""));
        assert_eq!(parse_bootstrap_config_toml(&text)?, defaults);
        Ok(())
    }
}
