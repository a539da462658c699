use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a session.
///
/// See the state table in [`SessionStatus::transition`] for the full
/// transition graph. `deleted_at` (tracked outside this enum, on the
/// `Session` entity) is a terminal tombstone independent of `status` — once
/// set, no further transition is permitted regardless of what `status` says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Freshly created, builder has not yet produced a client / first message.
    Initializing,
    /// Waiting for the next enqueued message.
    Idle,
    /// A processor turn is actively streaming against the LLM client.
    Working,
    /// The last turn failed; `error_message` carries the reason.
    Error,
    /// A user explicitly interrupted an in-flight turn.
    Interrupted,
    /// Explicitly finished by a PM tool; no more turns expected.
    Completed,
    /// Deleted while not yet cleaned up (kept for symmetry with the state
    /// table; in practice `delete` sets `deleted_at` directly from `idle`).
    Cancelled,
}

/// The event driving a [`SessionStatus`] transition.
///
/// Kept as an explicit enum (rather than free-form `&str`) so the transition
/// table in [`SessionStatus::transition`] is exhaustively checked by the
/// compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// The builder produced the first queued message without starting a turn.
    BuilderIdle,
    /// A message was enqueued (from a user or another session).
    MessageEnqueued,
    /// The processor reached a clean end-of-turn.
    TurnComplete,
    /// The processor turn failed.
    TurnFailed,
    /// The user interrupted an in-flight turn.
    Interrupt,
    /// A PM tool explicitly marked the session finished.
    Finish,
    /// `resume` was invoked.
    Resume,
    /// `recreate` was invoked.
    Recreate,
    /// `delete` was invoked.
    Delete,
}

impl SessionStatus {
    /// Apply `event` to `self`, returning the resulting status per the
    /// session state machine, or [`CoreError::InvalidTransition`] if `event`
    /// has no edge from `self`.
    pub fn transition(self, event: SessionEvent) -> Result<Self, CoreError> {
        use SessionEvent as E;
        use SessionStatus as S;

        let next = match (self, event) {
            (S::Initializing, E::MessageEnqueued) => S::Working,
            (S::Initializing, E::BuilderIdle) => S::Idle,

            (S::Idle, E::MessageEnqueued) => S::Working,
            (S::Idle, E::Delete) => S::Cancelled,

            (S::Working, E::TurnComplete) => S::Idle,
            (S::Working, E::TurnFailed) => S::Error,
            (S::Working, E::Interrupt) => S::Interrupted,
            (S::Working, E::Finish) => S::Completed,

            (S::Error, E::Resume) => S::Idle,
            (S::Error, E::Recreate) => S::Working,

            (S::Interrupted, E::Resume) => S::Idle,

            (S::Completed, E::Resume) => S::Idle,

            _ => {
                return Err(CoreError::InvalidTransition {
                    from: self,
                    event,
                });
            }
        };
        Ok(next)
    }

    /// `true` if `error_message` must be cleared when transitioning to this
    /// status (idle and working both clear it, per the terminal invariant).
    #[must_use]
    pub fn clears_error_message(self) -> bool {
        matches!(self, Self::Idle | Self::Working)
    }

    /// The read-only kanban projection for this status.
    #[must_use]
    pub fn kanban_stage(self) -> KanbanStage {
        match self {
            Self::Initializing => KanbanStage::Backlog,
            Self::Idle => KanbanStage::Waiting,
            Self::Working => KanbanStage::Active,
            Self::Completed | Self::Cancelled => KanbanStage::Done,
            Self::Error | Self::Interrupted => KanbanStage::Waiting,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Error => "error",
            Self::Interrupted => "interrupted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The read-only kanban column a session's `status` projects onto.
///
/// Stored under the reserved `context.kanban_stage` key and kept in sync by
/// the executor on every status change; never written directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanStage {
    /// Not yet started.
    Backlog,
    /// Idle, error, or interrupted — waiting on the next input.
    Waiting,
    /// A turn is actively running.
    Active,
    /// Completed or cancelled.
    Done,
}

impl std::fmt::Display for KanbanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Backlog => "backlog",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}
