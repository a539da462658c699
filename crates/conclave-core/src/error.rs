use crate::status::{SessionEvent, SessionStatus};

/// Errors produced by core domain logic.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    /// No edge exists in the session state machine for `event` from `from`.
    #[error("invalid session transition: {event:?} from {from}")]
    InvalidTransition {
        /// The status the transition was attempted from.
        from: SessionStatus,
        /// The event that had no outgoing edge.
        event: SessionEvent,
    },

    /// A `pm` session was constructed without a `project_id`.
    #[error("pm sessions require a project_id")]
    PmRequiresProject,
}
