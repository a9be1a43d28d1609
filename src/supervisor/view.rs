// ABOUTME: Read-only view of sync state published to presentation code.
// ABOUTME: Also defines the supervisor phases and one-shot notices.

use serde::Serialize;

use super::error::SyncError;
use crate::optimistic::OptimisticAction;
use crate::reconcile::SyncHealth;
use crate::snapshot::{Deploy, RuleDeploy, Snapshot};
use crate::types::{ActionKind, Target};

/// Lifecycle of the supervisor for its tracked resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    /// No resource tracked.
    #[default]
    Idle,
    /// Initial fetch in flight.
    Bootstrapping,
    /// Has a snapshot and the last sync attempt succeeded.
    Synced,
    /// Last sync attempt failed; the stale snapshot (if any) is retained.
    Degraded,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Bootstrapping => "bootstrapping",
            SyncPhase::Synced => "synced",
            SyncPhase::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Immutable copy of everything presentation code may read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncView {
    pub phase: SyncPhase,
    pub target: Option<Target>,
    pub snapshot: Option<Snapshot>,
    pub health: SyncHealth,
    /// Optimistic actions awaiting confirmation.
    pub pending: Vec<OptimisticAction>,
    /// Actions whose submission request is still in flight.
    pub submitting: Vec<ActionKind>,
    /// The push stream is connected.
    pub streaming: bool,
    /// The poll timer is armed.
    pub polling: bool,
}

impl SyncView {
    pub fn latest_deploy(&self) -> Option<&Deploy> {
        let target = self.target.as_ref()?;
        self.snapshot.as_ref()?.latest_deploy(&target.environment)
    }

    pub fn latest_rule_deploy(&self) -> Option<&RuleDeploy> {
        let target = self.target.as_ref()?;
        self.snapshot.as_ref()?.latest_rule_deploy(&target.environment)
    }

    pub fn is_pending(&self, kind: ActionKind) -> bool {
        self.pending.iter().any(|a| a.kind == kind)
    }

    /// Whether the action trigger for `kind` should be disabled.
    pub fn is_busy(&self, kind: ActionKind) -> bool {
        if self.is_pending(kind) || self.submitting.contains(&kind) {
            return true;
        }
        let (Some(target), Some(snapshot)) = (self.target.as_ref(), self.snapshot.as_ref()) else {
            return false;
        };
        match kind {
            ActionKind::Deploy => snapshot.has_live_deploy(&target.environment),
            ActionKind::PublishRules => snapshot.has_live_rule_deploy(&target.environment),
        }
    }

    /// Showing data known to be out of date.
    pub fn is_stale(&self) -> bool {
        self.phase == SyncPhase::Degraded
    }
}

/// One-shot events for the caller, delivered on a broadcast channel.
#[derive(Debug, Clone)]
pub enum SyncNotice {
    /// A failure the user should see (timeout, rejected action, drift).
    Failure { target: Target, error: SyncError },
    /// The server reported the resource gone; tracking stopped.
    ResourceDeleted { target: Target },
}

impl SyncNotice {
    pub fn target(&self) -> &Target {
        match self {
            SyncNotice::Failure { target, .. } | SyncNotice::ResourceDeleted { target } => target,
        }
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SyncNotice::Failure { error, .. } => Some(error),
            SyncNotice::ResourceDeleted { .. } => None,
        }
    }
}
