//! Local workspace filesystem adapter.

use ledger_ops_ports::{BoxFuture, PermissionChange, WorkspacePort};
use ledger_ops_shared::{ErrorEnvelope, RequestContext, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Workspace adapter using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWorkspace;

impl LocalWorkspace {
    /// Create the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn with_path(error: std::io::Error, path: &Path) -> ErrorEnvelope {
    ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().into_owned())
}

impl WorkspacePort for LocalWorkspace {
    fn exists(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            tokio::fs::try_exists(&path)
                .await
                .map_err(|error| with_path(error, &path))
        })
    }

    fn read_text(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|error| with_path(error, &path))
        })
    }

    fn write_text(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
        contents: String,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            tokio::fs::write(&path, contents)
                .await
                .map_err(|error| with_path(error, &path))
        })
    }

    fn copy_file(
        &self,
        _ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            tokio::fs::copy(&from, &to)
                .await
                .map(|_| ())
                .map_err(|error| with_path(error, &from))
        })
    }

    fn append_file(
        &self,
        _ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let fragment = tokio::fs::read(&from)
                .await
                .map_err(|error| with_path(error, &from))?;
            let mut target = tokio::fs::OpenOptions::new()
                .append(true)
                .open(&to)
                .await
                .map_err(|error| with_path(error, &to))?;
            target
                .write_all(&fragment)
                .await
                .map_err(|error| with_path(error, &to))?;
            target.flush().await.map_err(|error| with_path(error, &to))
        })
    }

    fn remove_file(&self, _ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|error| with_path(error, &path))
        })
    }

    fn set_permissions(
        &self,
        _ctx: &RequestContext,
        path: PathBuf,
        change: PermissionChange,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|error| with_path(error, &path))?;
            let permissions = apply_change(metadata.permissions(), change);
            tokio::fs::set_permissions(&path, permissions)
                .await
                .map_err(|error| with_path(error, &path))
        })
    }
}

#[cfg(unix)]
fn apply_change(permissions: std::fs::Permissions, change: PermissionChange) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    let mode = match change {
        PermissionChange::OwnerReadOnly => 0o400,
        PermissionChange::AddExecutable => permissions.mode() | 0o111,
    };
    std::fs::Permissions::from_mode(mode)
}

#[cfg(not(unix))]
fn apply_change(
    mut permissions: std::fs::Permissions,
    change: PermissionChange,
) -> std::fs::Permissions {
    if change == PermissionChange::OwnerReadOnly {
        permissions.set_readonly(true);
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_ops_shared::ErrorCode;
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

    #[tokio::test]
    async fn copy_then_append_assembles_config() -> Result<()> {
        let dir = temp_dir("ledger-ops-workspace");
        let ctx = RequestContext::new_run();
        let workspace = LocalWorkspace::new();

        workspace
            .write_text(&ctx, dir.join("template"), "bind=all\n".to_owned())
            .await?;
        workspace
            .write_text(&ctx, dir.join("fragment"), "join=host-a:29015\n".to_owned())
            .await?;
        workspace
            .copy_file(&ctx, dir.join("template"), dir.join("conf"))
            .await?;
        workspace
            .append_file(&ctx, dir.join("fragment"), dir.join("conf"))
            .await?;

        let assembled = workspace.read_text(&ctx, dir.join("conf")).await?;
        assert_eq!(assembled, "bind=all\njoin=host-a:29015\n");
        let template = workspace.read_text(&ctx, dir.join("template")).await?;
        assert_eq!(template, "bind=all\n");

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_report_not_found_with_path() -> Result<()> {
        let dir = temp_dir("ledger-ops-workspace-missing");
        let ctx = RequestContext::new_run();
        let workspace = LocalWorkspace::new();

        assert!(!workspace.exists(&ctx, dir.join("pem")).await?);
        let error = workspace.remove_file(&ctx, dir.join("pem")).await.err();
        assert!(matches!(
            error,
            Some(ref envelope)
                if envelope.code == ErrorCode::not_found() && envelope.metadata.contains_key("path")
        ));

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn permission_changes_apply_modes() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("ledger-ops-workspace-modes");
        let ctx = RequestContext::new_run();
        let workspace = LocalWorkspace::new();
        let pem = dir.join("cluster.pem");
        let script = dir.join("add2known_hosts.sh");
        workspace.write_text(&ctx, pem.clone(), "key".to_owned()).await?;
        workspace
            .write_text(&ctx, script.clone(), "#!/bin/sh\n".to_owned())
            .await?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o640))?;

        workspace
            .set_permissions(&ctx, pem.clone(), PermissionChange::OwnerReadOnly)
            .await?;
        workspace
            .set_permissions(&ctx, script.clone(), PermissionChange::AddExecutable)
            .await?;

        assert_eq!(std::fs::metadata(&pem)?.permissions().mode() & 0o777, 0o400);
        assert_eq!(std::fs::metadata(&script)?.permissions().mode() & 0o777, 0o751);

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }
}
