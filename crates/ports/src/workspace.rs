//! Working-directory filesystem boundary contract.

use crate::BoxFuture;
use ledger_ops_shared::{RequestContext, Result};
use std::path::PathBuf;

/// Permission changes the pipeline applies to generated or sensitive files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChange {
    /// Mode `0400`: owner may read, nobody else may do anything.
    OwnerReadOnly,
    /// Add execute bits for owner, group and others, keeping the rest.
    AddExecutable,
}

/// Boundary contract for file operations on the operator's workspace.
pub trait WorkspacePort: Send + Sync {
    /// Returns true if `path` exists.
    fn exists(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<bool>>;

    /// Read a UTF-8 text file.
    fn read_text(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<String>>;

    /// Replace the contents of a file (created if missing).
    fn write_text(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
        contents: String,
    ) -> BoxFuture<'_, Result<()>>;

    /// Copy `from` over `to`.
    fn copy_file(
        &self,
        ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>>;

    /// Append the contents of `from` to the end of `to`.
    fn append_file(
        &self,
        ctx: &RequestContext,
        from: PathBuf,
        to: PathBuf,
    ) -> BoxFuture<'_, Result<()>>;

    /// Delete a file.
    fn remove_file(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<()>>;

    /// Apply a permission change.
    fn set_permissions(
        &self,
        ctx: &RequestContext,
        path: PathBuf,
        change: PermissionChange,
    ) -> BoxFuture<'_, Result<()>>;
}
