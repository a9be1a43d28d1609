// ABOUTME: Synchronous state machine for one tracked resource.
// ABOUTME: Every sync decision reads and mutates this struct; the actor only performs I/O.

use chrono::Utc;
use std::collections::BTreeSet;
use tokio::time::Instant;

use super::error::ActionError;
use super::view::{SyncPhase, SyncView};
use crate::config::Config;
use crate::optimistic::{ActionKey, ConfirmationTimeout};
use crate::poll::{Activity, CadencePolicy, MAX_IN_FLIGHT_FETCHES, PollScheduler};
use crate::reconcile::{
    Applied, ReconcileError, Reconciler, RequestSequencer, RequestToken, SyncState,
};
use crate::snapshot::Snapshot;
use crate::transport::{ChannelEvent, FetchError, SubmitError, TransportError};
use crate::types::{ActionKind, Target};

/// What became of a fetch response.
#[derive(Debug)]
pub enum FetchOutcome {
    Applied(Applied),
    /// A newer response was already applied; this one was dropped.
    Stale,
    Failed(FetchError),
    Mismatched(ReconcileError),
    /// The server no longer knows the resource.
    Deleted,
}

/// What the actor must do after a channel event.
#[derive(Debug)]
pub enum ChannelOutcome {
    Applied(Applied),
    Mismatched(ReconcileError),
    /// Stream went away; fetch immediately with this token.
    FetchNow(RequestToken),
    /// A connected stream failed. Polling takes over once it reports down.
    Dropped(TransportError),
    Deleted,
    Nothing,
}

/// Sync state machine for a single [`Target`].
#[derive(Debug)]
pub struct Session {
    target: Target,
    phase: SyncPhase,
    state: SyncState,
    scheduler: PollScheduler,
    sequencer: RequestSequencer,
    submitting: BTreeSet<ActionKind>,
}

impl Session {
    pub fn new(target: Target, config: &Config) -> Self {
        let state = SyncState::new(
            target.id.clone(),
            target.environment.clone(),
            config.optimistic.timeout,
        );
        let policy = CadencePolicy::for_scope(&config.polling, target.scope);
        Self {
            target,
            phase: SyncPhase::Bootstrapping,
            state,
            scheduler: PollScheduler::new(policy),
            sequencer: RequestSequencer::new(),
            submitting: BTreeSet::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Start polling and return the token for the initial fetch.
    pub fn bootstrap(&mut self, now: Instant) -> RequestToken {
        tracing::debug!("Bootstrapping {}", self.target);
        self.scheduler.start(now);
        self.sequencer.issue()
    }

    /// A fetch outside the poll timer.
    pub fn begin_fetch(&mut self) -> RequestToken {
        self.sequencer.issue()
    }

    /// The poll timer fired. Returns a token if a fetch should go out.
    pub fn on_poll_due(&mut self, now: Instant, in_flight: usize) -> Option<RequestToken> {
        if !self.scheduler.fire(now) {
            return None;
        }
        if in_flight >= MAX_IN_FLIGHT_FETCHES {
            tracing::debug!(
                "Skipping poll of {}: {} fetches still in flight",
                self.target,
                in_flight
            );
            return None;
        }
        Some(self.sequencer.issue())
    }

    pub fn on_fetch_result(
        &mut self,
        token: RequestToken,
        result: Result<Snapshot, FetchError>,
        now: Instant,
    ) -> FetchOutcome {
        if !self.sequencer.is_current(token) {
            tracing::debug!(
                "Discarding superseded response #{} for {}",
                token.value(),
                self.target
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.sequencer.accept(token);
                match self.apply(snapshot, now) {
                    Ok(applied) => FetchOutcome::Applied(applied),
                    Err(e) => FetchOutcome::Mismatched(e),
                }
            }
            Err(FetchError::NotFound) => FetchOutcome::Deleted,
            Err(e) => {
                tracing::warn!("Sync of {} failed: {}", self.target, e);
                Reconciler::record_failure(&mut self.state, e.to_string());
                self.phase = SyncPhase::Degraded;
                FetchOutcome::Failed(e)
            }
        }
    }

    pub fn on_channel_event(&mut self, event: ChannelEvent, now: Instant) -> ChannelOutcome {
        match event {
            ChannelEvent::Snapshot(snapshot) => {
                // Anything fetched before this push is older than it.
                self.sequencer.supersede_all();
                match self.apply(snapshot, now) {
                    Ok(applied) => ChannelOutcome::Applied(applied),
                    Err(e) => ChannelOutcome::Mismatched(e),
                }
            }
            ChannelEvent::Error(e) => {
                self.state.health.last_transport_error = Some(e.to_string());
                if e.is_fatal() && self.state.health.transport_connected {
                    ChannelOutcome::Dropped(e)
                } else {
                    ChannelOutcome::Nothing
                }
            }
            ChannelEvent::Connection(true) => {
                tracing::debug!("Live updates connected for {}", self.target);
                self.state.health.transport_connected = true;
                self.scheduler.stop();
                ChannelOutcome::Nothing
            }
            ChannelEvent::Connection(false) => match self.on_transport_lost(now) {
                Some(token) => ChannelOutcome::FetchNow(token),
                None => ChannelOutcome::Nothing,
            },
            ChannelEvent::Deleted => ChannelOutcome::Deleted,
        }
    }

    /// The stream disconnected or its task ended: fall back to polling and
    /// close the gap with an immediate fetch.
    pub fn on_transport_lost(&mut self, now: Instant) -> Option<RequestToken> {
        let was_connected = self.state.health.transport_connected;
        self.state.health.transport_connected = false;
        if self.scheduler.is_running() {
            return None;
        }
        if was_connected {
            tracing::debug!("Live updates lost for {}, polling", self.target);
        }
        self.scheduler.start(now);
        Some(self.sequencer.issue())
    }

    /// Force-clear optimistic actions whose countdown ran out.
    pub fn expire_actions(&mut self, now: Instant) -> Vec<ConfirmationTimeout> {
        let expired = self.state.optimistic.expire(now);
        if !expired.is_empty() {
            self.refresh_activity(now);
        }
        expired
    }

    /// Earliest optimistic expiry.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.state.optimistic.next_deadline()
    }

    fn action_key(&self, kind: ActionKind) -> ActionKey {
        ActionKey::new(self.target.id.clone(), self.target.environment.clone(), kind)
    }

    /// Refuse a second concurrent action of the same kind.
    pub fn check_action(&self, kind: ActionKind) -> Result<(), ActionError> {
        let pending = self.state.optimistic.is_pending(&self.action_key(kind));
        let blocked = self.state.snapshot.as_ref().is_some_and(|s| match kind {
            ActionKind::Deploy => s.has_live_deploy(&self.target.environment),
            ActionKind::PublishRules => s.has_live_rule_deploy(&self.target.environment),
        });
        if pending || blocked || self.submitting.contains(&kind) {
            return Err(ActionError::Busy(kind));
        }
        Ok(())
    }

    /// Mark `kind` as submitting. Fails if it is busy.
    pub fn begin_submit(&mut self, kind: ActionKind) -> Result<(), ActionError> {
        self.check_action(kind)?;
        self.submitting.insert(kind);
        Ok(())
    }

    /// The action POST resolved. On acceptance the optimistic entry is
    /// recorded and checked against the snapshot already held, since a
    /// push can show the new work before the POST reply lands. Unless the
    /// stream is connected, a fetch token is returned to pick up the new
    /// work quickly.
    pub fn on_submit_result(
        &mut self,
        kind: ActionKind,
        result: Result<(), SubmitError>,
        now: Instant,
    ) -> Result<Option<RequestToken>, ActionError> {
        self.submitting.remove(&kind);
        if let Err(source) = result {
            tracing::warn!("{} for {} rejected: {}", kind, self.target, source);
            return Err(ActionError::Rejected { kind, source });
        }

        let key = self.action_key(kind);
        if self.state.optimistic.record(key, now, Utc::now()).is_err() {
            return Err(ActionError::Busy(kind));
        }
        if let Some(snapshot) = self.state.snapshot.as_ref() {
            self.state.optimistic.clear_confirmed(snapshot);
        }
        self.refresh_activity(now);

        if self.state.health.transport_connected {
            Ok(None)
        } else {
            Ok(Some(self.sequencer.issue()))
        }
    }

    pub fn view(&self) -> SyncView {
        SyncView {
            phase: self.phase,
            target: Some(self.target.clone()),
            snapshot: self.state.snapshot.clone(),
            health: self.state.health.clone(),
            pending: self.state.optimistic.actions(),
            submitting: self.submitting.iter().copied().collect(),
            streaming: self.state.health.transport_connected,
            polling: self.scheduler.is_running(),
        }
    }

    fn apply(&mut self, snapshot: Snapshot, now: Instant) -> Result<Applied, ReconcileError> {
        match Reconciler::apply(&mut self.state, snapshot, Utc::now()) {
            Ok(applied) => {
                if applied.changed {
                    tracing::debug!("Snapshot of {} updated", self.target);
                }
                self.phase = SyncPhase::Synced;
                self.refresh_activity(now);
                Ok(applied)
            }
            Err(e) => {
                tracing::warn!("Rejected snapshot for {}: {}", self.target, e);
                Reconciler::record_failure(&mut self.state, e.to_string());
                self.phase = SyncPhase::Degraded;
                Err(e)
            }
        }
    }

    fn refresh_activity(&mut self, now: Instant) {
        let activity = Activity {
            active: self.state.is_active(),
            provisioning: self.state.is_provisioning(),
        };
        self.scheduler.observe(activity, now);
    }
}
