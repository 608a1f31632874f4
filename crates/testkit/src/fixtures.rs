//! Loaders for the fixture files under `crates/testkit/fixtures`.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    MissingFixture {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    FixtureRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Fixture file could not be parsed.
    FixtureParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFixture { path } => {
                write!(formatter, "missing fixture: {}", path.display())
            },
            Self::FixtureRead { path, source } => {
                write!(
                    formatter,
                    "failed to read fixture {}: {}",
                    path.display(),
                    source
                )
            },
            Self::FixtureParse { path, source } => {
                write!(
                    formatter,
                    "failed to parse fixture {}: {}",
                    path.display(),
                    source
                )
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FixtureRead { source, .. } => Some(source),
            Self::FixtureParse { source, .. } => Some(source),
            Self::MissingFixture { .. } => None,
        }
    }
}

/// Directory holding the fixture files.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Absolute path of a fixture.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixture_root().join(relative_path)
}

/// Read a fixture as text.
pub fn read_fixture(relative_path: &str) -> Result<String, FixtureError> {
    let path = fixture_path(relative_path);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contents),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            Err(FixtureError::MissingFixture { path })
        },
        Err(error) => Err(FixtureError::FixtureRead {
            path,
            source: error,
        }),
    }
}

/// Read and deserialize a JSON fixture.
pub fn load_json_fixture<T: DeserializeOwned>(relative_path: &str) -> Result<T, FixtureError> {
    let contents = read_fixture(relative_path)?;
    serde_json::from_str(&contents).map_err(|error| FixtureError::FixtureParse {
        path: fixture_path(relative_path),
        source: error,
    })
}

/// A complete proxy environment (all nine variables set).
pub fn proxy_env_fixture() -> Result<BTreeMap<String, String>, FixtureError> {
    load_json_fixture("env/proxy-env.valid.json")
}

/// The reverse-proxy config template with every placeholder in use.
pub fn proxy_template_fixture() -> Result<String, FixtureError> {
    read_fixture("proxy/nginx.conf.template")
}
