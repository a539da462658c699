//! `common_tools` — file-ops available to every session type, scoped to the
//! session's own working directory.
//!
//! Grounded on `original_source/backend/app/infrastructure/mcp/servers/common_tools.py`
//! and `astrid-tools`'s `read_file.rs`/`write_file.rs`/`glob.rs`, generalized
//! with the one guard the original adds that `astrid-tools` doesn't need
//! (its tools run against an already-trusted local workspace): every path
//! argument must resolve inside [`crate::context::RequestContext::workspace_root`].

mod glob;
mod grep;
mod read_file;
mod write_file;

pub use glob::GlobTool;
pub use grep::GrepTool;
pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Resolve `relative` against `workspace_root`, rejecting anything that
/// escapes it (`..`, absolute paths elsewhere, symlink traversal).
///
/// Mirrors `FileAgentRepository::load_supporting_doc`'s canonicalize-then-`starts_with`
/// check in `conclave-repos`, the same guard applied to a session's own
/// scratch directory instead of an agent's.
pub(crate) async fn resolve_within_root(workspace_root: &Path, relative: &str) -> Result<PathBuf, ToolError> {
    let candidate = workspace_root.join(relative);
    let canonical_root = tokio::fs::canonicalize(workspace_root)
        .await
        .map_err(|_| ToolError::PathTraversal(relative.to_string()))?;

    // The file may not exist yet (write_file); canonicalize what does exist
    // and re-attach the remainder, the way `mkdir -p` style tools must.
    let canonical = match tokio::fs::canonicalize(&candidate).await {
        Ok(p) => p,
        Err(_) => {
            let parent = candidate.parent().unwrap_or(workspace_root);
            let canonical_parent = tokio::fs::canonicalize(parent)
                .await
                .map_err(|_| ToolError::PathTraversal(relative.to_string()))?;
            let file_name = candidate
                .file_name()
                .ok_or_else(|| ToolError::PathTraversal(relative.to_string()))?;
            canonical_parent.join(file_name)
        }
    };

    if !canonical.starts_with(&canonical_root) {
        return Err(ToolError::PathTraversal(relative.to_string()));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_within_root(dir.path(), "../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(_)));
    }

    #[tokio::test]
    async fn in_root_paths_resolve() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "hi").await.unwrap();
        let resolved = resolve_within_root(dir.path(), "a.txt").await.unwrap();
        assert!(resolved.ends_with("a.txt"));
    }

    #[tokio::test]
    async fn not_yet_existing_files_in_root_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_within_root(dir.path(), "new.txt").await.unwrap();
        assert!(resolved.ends_with("new.txt"));
    }
}
