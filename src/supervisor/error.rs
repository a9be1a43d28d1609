// ABOUTME: Sync error taxonomy with SNAFU, plus errors returned to action callers.
// ABOUTME: Every variant is non-fatal; the last good snapshot always stays displayed.

use snafu::Snafu;
use std::time::Duration;

use crate::transport::{FetchError, SubmitError, TransportError};
use crate::types::ActionKind;

/// Unified sync failure for programmatic handling and user-facing notices.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum SyncError {
    #[snafu(display("live updates unavailable: {source}"))]
    Transport { source: TransportError },

    #[snafu(display("sync delayed: {source}"))]
    Fetch { source: FetchError },

    #[snafu(display("{action} could not be submitted: {source}"))]
    ActionSubmission {
        action: ActionKind,
        source: SubmitError,
    },

    #[snafu(display("{action} was not confirmed within {waited:?}, please retry"))]
    ConfirmationTimeout { action: ActionKind, waited: Duration },

    #[snafu(display("unrecognized status '{status}' from server"))]
    StatusVocabularyDrift { status: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// Stream dropped or unreachable; polling took over.
    Transport,
    /// A single poll attempt failed; retried on the next tick.
    Fetch,
    /// The action POST failed; no optimistic state was created.
    ActionSubmission,
    /// An optimistic action expired unconfirmed.
    ConfirmationTimeout,
    /// The server sent a status outside the known vocabulary.
    StatusVocabularyDrift,
}

impl SyncError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::Transport { .. } => SyncErrorKind::Transport,
            SyncError::Fetch { .. } => SyncErrorKind::Fetch,
            SyncError::ActionSubmission { .. } => SyncErrorKind::ActionSubmission,
            SyncError::ConfirmationTimeout { .. } => SyncErrorKind::ConfirmationTimeout,
            SyncError::StatusVocabularyDrift { .. } => SyncErrorKind::StatusVocabularyDrift,
        }
    }

    /// The action this error concerns, if any.
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            SyncError::ActionSubmission { action, .. }
            | SyncError::ConfirmationTimeout { action, .. } => Some(*action),
            _ => None,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(source: TransportError) -> Self {
        SyncError::Transport { source }
    }
}

impl From<FetchError> for SyncError {
    fn from(source: FetchError) -> Self {
        SyncError::Fetch { source }
    }
}

/// Why a requested action was not started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("no resource is being tracked")]
    NotTracking,

    #[error("{0} is already in progress")]
    Busy(ActionKind),

    #[error("{kind} was rejected: {source}")]
    Rejected {
        kind: ActionKind,
        #[source]
        source: SubmitError,
    },

    #[error("{0} was cancelled because the tracked resource changed")]
    Cancelled(ActionKind),

    #[error("status sync has stopped")]
    Stopped,
}
