// ABOUTME: Reconciler: the single path by which snapshots enter the sync state.
// ABOUTME: Wholesale, idempotent replacement plus optimistic clearing and health bookkeeping.

mod sequencer;
mod state;

pub use sequencer::{RequestSequencer, RequestToken};
pub use state::{SyncHealth, SyncState};

use chrono::{DateTime, Utc};

use crate::diagnostics::{Diagnostics, Warning};
use crate::optimistic::OptimisticAction;
use crate::snapshot::Snapshot;
use crate::types::ResourceId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("snapshot is for resource {received}, expected {expected}")]
    ResourceMismatch {
        expected: ResourceId,
        received: ResourceId,
    },
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Default)]
pub struct Applied {
    /// Optimistic entries confirmed by this snapshot.
    pub confirmed: Vec<OptimisticAction>,
    /// Unrecognized statuses seen for the first time on this resource.
    pub new_drift: Vec<String>,
    /// Whether the stored snapshot changed.
    pub changed: bool,
    pub diagnostics: Diagnostics,
}

/// Validate `incoming` against the tracked resource and strip entities that
/// belong elsewhere. The server snapshot is complete, so the result replaces
/// the previous one outright.
pub fn merge(
    expected: &ResourceId,
    mut incoming: Snapshot,
    diagnostics: &mut Diagnostics,
) -> Result<Snapshot, ReconcileError> {
    if &incoming.resource.id != expected {
        return Err(ReconcileError::ResourceMismatch {
            expected: expected.clone(),
            received: incoming.resource.id,
        });
    }

    let owner = incoming.resource.id.clone();
    incoming.deploys.retain(|d| {
        let own = d.resource_id == owner;
        if !own {
            diagnostics.warn(Warning::foreign_entity(format!(
                "dropping deploy {} owned by {} from snapshot of {}",
                d.id, d.resource_id, owner
            )));
        }
        own
    });
    incoming.rules.retain(|r| {
        let own = r.resource_id == owner;
        if !own {
            diagnostics.warn(Warning::foreign_entity(format!(
                "dropping rule {} owned by {} from snapshot of {}",
                r.id, r.resource_id, owner
            )));
        }
        own
    });
    incoming.rule_deploys.retain(|d| {
        let own = d.resource_id == owner;
        if !own {
            diagnostics.warn(Warning::foreign_entity(format!(
                "dropping rule deploy {} owned by {} from snapshot of {}",
                d.id, d.resource_id, owner
            )));
        }
        own
    });

    Ok(incoming)
}

/// Applies snapshots to a [`SyncState`].
pub struct Reconciler;

impl Reconciler {
    /// Merge `incoming` into `state`, clear confirmed optimistic entries, and
    /// mark the sync healthy. Applying the same snapshot twice leaves the
    /// snapshot and optimistic set unchanged.
    pub fn apply(
        state: &mut SyncState,
        incoming: Snapshot,
        now: DateTime<Utc>,
    ) -> Result<Applied, ReconcileError> {
        let mut diagnostics = Diagnostics::default();
        let merged = merge(&state.resource, incoming, &mut diagnostics)?;

        let confirmed = state.optimistic.clear_confirmed(&merged);

        let unrecognized = merged.unrecognized_statuses();
        let mut new_drift = Vec::new();
        for status in &unrecognized {
            if state.reported_drift.insert(status.clone()) {
                diagnostics.warn(Warning::status_drift(status));
                new_drift.push(status.clone());
            }
        }

        let changed = state.snapshot.as_ref() != Some(&merged);
        state.snapshot = Some(merged);
        state.health.last_sync_at = Some(now);
        state.health.last_error = None;
        state.health.unrecognized_statuses = unrecognized;

        Ok(Applied {
            confirmed,
            new_drift,
            changed,
            diagnostics,
        })
    }

    /// Record a failed sync attempt. The last good snapshot stays in place.
    pub fn record_failure(state: &mut SyncState, message: impl Into<String>) {
        state.health.last_error = Some(message.into());
    }
}
