//! Errors raised by the subprocess-backed agent client.

use thiserror::Error;

/// Errors that can occur while driving an agent subprocess.
#[derive(Debug, Error)]
pub enum ClientError {
    /// `connect()` did not complete within the configured timeout.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// The subprocess could not be spawned, or exited before becoming ready.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Writing a query to the subprocess's stdin failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Reading or parsing a message from the subprocess's stdout failed.
    #[error("message streaming failed: {0}")]
    StreamingFailed(String),

    /// `interrupt()` failed to reach the subprocess.
    #[error("interrupt failed: {0}")]
    InterruptFailed(String),

    /// `disconnect()` failed to cleanly tear down the subprocess.
    #[error("disconnect failed: {0}")]
    DisconnectFailed(String),

    /// Underlying process I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line on the subprocess's stdout was not valid JSON, or not a
    /// recognized message shape.
    #[error("malformed message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for fallible client operations.
pub type ClientResult<T> = Result<T, ClientError>;
