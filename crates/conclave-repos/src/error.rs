//! Repository error types.

/// Errors from the file-backed Agent/Skill repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// No entity exists at the given id.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entity already exists at the given id.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A path resolved outside the entity's own directory.
    #[error("path traversal attempt detected: {0}")]
    PathTraversal(String),

    /// The frontmatter block was malformed or missing a required field.
    #[error("invalid frontmatter in {path}: {reason}")]
    InvalidFrontmatter {
        /// The file the frontmatter came from.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
