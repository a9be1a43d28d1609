// ABOUTME: Sync supervisor: owns the tracked resource's state and coordinates every channel.
// ABOUTME: Exports the actor handle, the session state machine, views, and sync errors.

mod actor;
mod error;
mod session;
mod view;

pub use actor::{SyncHandle, SyncSupervisor};
pub use error::{ActionError, SyncError, SyncErrorKind};
pub use session::{ChannelOutcome, FetchOutcome, Session};
pub use view::{SyncNotice, SyncPhase, SyncView};
