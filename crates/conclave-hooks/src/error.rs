//! Hook errors.

use thiserror::Error;

/// Errors raised while building or applying a hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// The matcher pattern is not a valid regex.
    #[error("invalid matcher pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}
