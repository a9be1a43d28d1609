// ABOUTME: Timer-driven fallback fetch scheduler for one tracked resource.
// ABOUTME: Owns the next poll deadline; the supervisor performs the fetch when it fires.

use std::time::Duration;
use tokio::time::Instant;

use super::cadence::{Activity, ActivityTracker, Cadence, CadencePolicy};

/// Poll timer with adaptive cadence.
///
/// A stopped scheduler has no deadline and its [`tick`](Self::tick) never
/// resolves. Stopping is total: there is no superseded timer left behind.
#[derive(Debug)]
pub struct PollScheduler {
    policy: CadencePolicy,
    activity: ActivityTracker,
    deadline: Option<Instant>,
    cadence: Option<Cadence>,
}

impl PollScheduler {
    pub fn new(policy: CadencePolicy) -> Self {
        Self {
            policy,
            activity: ActivityTracker::default(),
            deadline: None,
            cadence: None,
        }
    }

    pub fn policy(&self) -> &CadencePolicy {
        &self.policy
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Begin polling; the first tick fires one interval from `now`.
    pub fn start(&mut self, now: Instant) {
        if self.deadline.is_some() {
            return;
        }
        let interval = self.interval(now);
        tracing::debug!("Polling started ({:?} interval)", interval);
        self.deadline = Some(now + interval);
    }

    pub fn stop(&mut self) {
        if self.deadline.take().is_some() {
            tracing::debug!("Polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Current tier at `now`.
    pub fn cadence(&self, now: Instant) -> Cadence {
        self.policy.cadence(&self.activity, now)
    }

    /// Current interval at `now`.
    pub fn interval(&self, now: Instant) -> Duration {
        self.policy.interval(self.cadence(now))
    }

    /// Feed the latest activity signal. If the resulting interval would fire
    /// earlier than the pending deadline, the deadline is pulled in.
    pub fn observe(&mut self, activity: Activity, now: Instant) {
        if self.activity.observe(activity, now) {
            tracing::debug!(
                "Activity {}",
                if activity.active { "started" } else { "ended" }
            );
        }
        if let Some(deadline) = self.deadline {
            let candidate = now + self.interval(now);
            if candidate < deadline {
                self.deadline = Some(candidate);
            }
        }
        self.note_cadence(now);
    }

    /// Wait for the next deadline. Pending forever while stopped.
    pub async fn tick(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Handle a fired tick: re-arm one interval from `now`. Returns whether
    /// a fetch is due (false if the scheduler was stopped meanwhile).
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.deadline.is_none() {
            return false;
        }
        self.note_cadence(now);
        self.deadline = Some(now + self.interval(now));
        true
    }

    fn note_cadence(&mut self, now: Instant) {
        let cadence = self.cadence(now);
        if self.cadence != Some(cadence) {
            tracing::debug!(
                "Poll cadence now {} ({:?})",
                cadence,
                self.policy.interval(cadence)
            );
            self.cadence = Some(cadence);
        }
    }
}
