// ABOUTME: Optimistic action tracker for user actions the server hasn't echoed yet.
// ABOUTME: Entries clear on a matching live entity or force-expire after a fixed timeout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::snapshot::Snapshot;
use crate::types::{ActionKind, Environment, ResourceId};

/// At most one optimistic entry exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey {
    pub resource: ResourceId,
    pub environment: Environment,
    pub kind: ActionKind,
}

impl ActionKey {
    pub fn new(resource: ResourceId, environment: Environment, kind: ActionKind) -> Self {
        Self {
            resource,
            environment,
            kind,
        }
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}@{}", self.kind, self.resource, self.environment)
    }
}

/// Client-side placeholder for an action not yet confirmed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticAction {
    pub resource_id: ResourceId,
    pub environment: Environment,
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
}

impl OptimisticAction {
    pub fn key(&self) -> ActionKey {
        ActionKey::new(self.resource_id.clone(), self.environment.clone(), self.kind)
    }

    /// Whether `snapshot` shows a live entity confirming this action.
    pub fn is_confirmed_by(&self, snapshot: &Snapshot) -> bool {
        if snapshot.resource.id != self.resource_id {
            return false;
        }
        match self.kind {
            ActionKind::Deploy => snapshot.has_live_deploy(&self.environment),
            ActionKind::PublishRules => snapshot.has_live_rule_deploy(&self.environment),
        }
    }
}

/// An optimistic entry expired without confirmation. The user should retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationTimeout {
    pub action: OptimisticAction,
    pub waited: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimisticError {
    #[error("{0} is already awaiting confirmation")]
    AlreadyPending(ActionKey),
}

#[derive(Debug, Clone)]
struct Pending {
    action: OptimisticAction,
    recorded_at: Instant,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct OptimisticTracker {
    timeout: Duration,
    pending: BTreeMap<ActionKey, Pending>,
}

impl OptimisticTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: BTreeMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a tentative entry and start its expiry countdown.
    pub fn record(
        &mut self,
        key: ActionKey,
        now: Instant,
        created_at: DateTime<Utc>,
    ) -> Result<&OptimisticAction, OptimisticError> {
        if self.pending.contains_key(&key) {
            return Err(OptimisticError::AlreadyPending(key));
        }

        tracing::debug!("Awaiting confirmation of {}", key);
        let action = OptimisticAction {
            resource_id: key.resource.clone(),
            environment: key.environment.clone(),
            kind: key.kind,
            created_at,
        };
        let pending = Pending {
            action,
            recorded_at: now,
            expires_at: now + self.timeout,
        };
        let entry = self.pending.entry(key).or_insert(pending);
        Ok(&entry.action)
    }

    pub fn clear(&mut self, key: &ActionKey) -> Option<OptimisticAction> {
        self.pending.remove(key).map(|p| p.action)
    }

    /// Drop every entry confirmed by a live entity in `snapshot`.
    pub fn clear_confirmed(&mut self, snapshot: &Snapshot) -> Vec<OptimisticAction> {
        let confirmed: Vec<ActionKey> = self
            .pending
            .iter()
            .filter(|(_, p)| p.action.is_confirmed_by(snapshot))
            .map(|(key, _)| key.clone())
            .collect();

        confirmed
            .iter()
            .filter_map(|key| {
                tracing::debug!("Server confirmed {}", key);
                self.clear(key)
            })
            .collect()
    }

    /// Force-clear entries whose countdown has run out. Each entry yields
    /// exactly one timeout since it is removed here.
    pub fn expire(&mut self, now: Instant) -> Vec<ConfirmationTimeout> {
        let expired: Vec<ActionKey> = self
            .pending
            .iter()
            .filter(|(_, p)| p.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let timeout = self.timeout;
        expired
            .into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .map(|p| {
                tracing::warn!(
                    "No confirmation for {} after {:?}, clearing",
                    p.action.key(),
                    timeout
                );
                ConfirmationTimeout {
                    waited: now.saturating_duration_since(p.recorded_at),
                    action: p.action,
                }
            })
            .collect()
    }

    /// Earliest pending expiry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.expires_at).min()
    }

    pub fn is_pending(&self, key: &ActionKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Any unexpired entry for `(resource, environment)`.
    pub fn is_active(&self, resource: &ResourceId, environment: &Environment) -> bool {
        self.pending
            .keys()
            .any(|k| &k.resource == resource && &k.environment == environment)
    }

    pub fn actions(&self) -> Vec<OptimisticAction> {
        self.pending.values().map(|p| p.action.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.pending.clear();
    }
}
