// ABOUTME: Error types for talking to the status server.
// ABOUTME: Separates pull (fetch), push (stream), and action submission failures.

/// A single snapshot fetch failed. Retried on the next poll tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid snapshot payload: {0}")]
    Decode(String),

    #[error("resource no longer exists")]
    NotFound,
}

/// The event stream dropped or could not be opened. Recovered by polling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("stream connection failed: {0}")]
    Connect(String),

    #[error("stream rejected with HTTP {0}")]
    Rejected(u16),

    #[error("stream interrupted: {0}")]
    Interrupted(String),

    #[error("invalid stream event: {0}")]
    Decode(String),

    #[error("stream closed by server")]
    Closed,
}

impl TransportError {
    /// Whether the connection is gone (as opposed to one bad event).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Decode(_))
    }
}

/// The action POST was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("server rejected action with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}
