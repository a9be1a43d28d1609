// ABOUTME: Mutable sync state for one tracked resource: snapshot, health, optimistic set.
// ABOUTME: Mutated only through the Reconciler and the supervisor's session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::optimistic::OptimisticTracker;
use crate::snapshot::Snapshot;
use crate::types::{Environment, ResourceId};

/// Process-local diagnostic view of sync quality. Reset on identity change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHealth {
    pub transport_connected: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Last fetch failure; cleared by the next successful reconciliation.
    pub last_error: Option<String>,
    /// Last stream failure. Not a sync failure: polling covers for it.
    pub last_transport_error: Option<String>,
    /// Unrecognized statuses present in the current snapshot.
    pub unrecognized_statuses: Vec<String>,
}

/// Everything the supervisor owns for the resource it is tracking.
#[derive(Debug)]
pub struct SyncState {
    pub resource: ResourceId,
    pub environment: Environment,
    pub snapshot: Option<Snapshot>,
    pub health: SyncHealth,
    pub optimistic: OptimisticTracker,
    /// Drift values already logged for this resource.
    pub(crate) reported_drift: BTreeSet<String>,
}

impl SyncState {
    pub fn new(
        resource: ResourceId,
        environment: Environment,
        optimistic_timeout: Duration,
    ) -> Self {
        Self {
            resource,
            environment,
            snapshot: None,
            health: SyncHealth::default(),
            optimistic: OptimisticTracker::new(optimistic_timeout),
            reported_drift: BTreeSet::new(),
        }
    }

    /// Live server work or a pending optimistic action for the tracked
    /// resource and environment.
    pub fn is_active(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| s.has_live_activity(&self.environment))
            || self.optimistic.is_active(&self.resource, &self.environment)
    }

    pub fn is_provisioning(&self) -> bool {
        self.snapshot.as_ref().is_some_and(Snapshot::is_provisioning)
    }
}
