//! `PATH`-based tool locator.

use ledger_ops_ports::ToolLocatorPort;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolves tool names against an explicit search path.
#[derive(Debug, Clone, Default)]
pub struct PathToolLocator {
    search_path: Option<OsString>,
}

impl PathToolLocator {
    /// Locator over the given `PATH`-style value.
    #[must_use]
    pub const fn new(search_path: Option<OsString>) -> Self {
        Self { search_path }
    }

    /// Locator over this process's `PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("PATH"))
    }
}

impl ToolLocatorPort for PathToolLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        if tool.is_empty() {
            return None;
        }
        let direct = Path::new(tool);
        if direct.components().count() > 1 {
            return is_executable(direct).then(|| direct.to_path_buf());
        }

        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(tool))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!("{prefix}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_file(path: &Path, mode: u32) {
        std::fs::write(path, "#!/bin/sh\n").expect("write file");
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).expect("chmod");
    }

    #[test]
    fn finds_executables_only() {
        let dir = temp_dir("ledger-ops-tools");
        write_file(&dir.join("fab"), 0o755);
        write_file(&dir.join("aws"), 0o644);

        let locator = PathToolLocator::new(Some(dir.clone().into_os_string()));
        assert_eq!(locator.locate("fab"), Some(dir.join("fab")));
        assert_eq!(locator.locate("aws"), None);
        assert_eq!(locator.locate("python"), None);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_path_finds_nothing() {
        let locator = PathToolLocator::new(None);
        assert_eq!(locator.locate("sh"), None);
        assert_eq!(locator.locate(""), None);
    }

    #[test]
    fn path_like_names_are_checked_directly() {
        let dir = temp_dir("ledger-ops-tools-direct");
        let tool = dir.join("fab");
        write_file(&tool, 0o700);

        let locator = PathToolLocator::new(None);
        let name = tool.to_string_lossy().into_owned();
        assert_eq!(locator.locate(&name), Some(tool));

        std::fs::remove_dir_all(dir).ok();
    }
}
