//! Reverse-proxy entrypoint options.

use std::path::PathBuf;

/// Default rendered config location inside the proxy image.
pub const DEFAULT_PROXY_CONFIG_FILE: &str = "/etc/nginx/nginx.conf";
/// Default proxy server program.
pub const DEFAULT_PROXY_SERVER: &str = "nginx";

/// Where the template lives and what runs once it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOptions {
    /// Template rendered in place.
    pub config_file: PathBuf,
    /// Server program that takes over the process.
    pub server_program: String,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_PROXY_CONFIG_FILE),
            server_program: DEFAULT_PROXY_SERVER.to_owned(),
        }
    }
}

impl ProxyOptions {
    /// Server arguments: point the server at the rendered file.
    #[must_use]
    pub fn server_args(&self) -> Vec<String> {
        vec![
            "-c".to_owned(),
            self.config_file.to_string_lossy().into_owned(),
        ]
    }
}
