// ABOUTME: The seam between the sync core and the status server.
// ABOUTME: Pull, push, and action submission behind one object-safe async trait.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::error::{FetchError, SubmitError, TransportError};
use super::sse::StreamEvent;
use crate::snapshot::Snapshot;
use crate::types::{ActionKind, Target};

/// Events from an open push stream. Ends (or yields a fatal error) when the
/// connection drops.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, TransportError>> + Send>>;

/// Server operations the sync core depends on.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    /// Fetch the current snapshot. Idempotent and side-effect free.
    async fn fetch(&self, target: &Target) -> Result<Snapshot, FetchError>;

    /// Open the push stream for `target`.
    async fn stream(&self, target: &Target) -> Result<EventStream, TransportError>;

    /// Submit a user action. `Ok` means the server accepted it.
    async fn submit(&self, target: &Target, kind: ActionKind) -> Result<(), SubmitError>;
}
