// ABOUTME: Adaptive poll cadence: fast while active, grace window after, slow when idle.
// ABOUTME: Pure policy plus an activity tracker that remembers when work last ended.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::PollingConfig;
use crate::types::ViewScope;

/// Externally observed activity signal for the tracked resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    /// A live deploy/rule deploy or a pending optimistic action exists.
    pub active: bool,
    /// The resource itself is still being provisioned.
    pub provisioning: bool,
}

/// Which interval tier the scheduler is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Fast,
    Provisioning,
    Slow,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Fast => write!(f, "fast"),
            Cadence::Provisioning => write!(f, "provisioning"),
            Cadence::Slow => write!(f, "slow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadencePolicy {
    pub fast: Duration,
    pub slow: Duration,
    pub provisioning: Duration,
    pub grace: Duration,
}

impl CadencePolicy {
    /// Policy for a single resource's detail view.
    pub fn detail(config: &PollingConfig) -> Self {
        Self {
            fast: config.fast_interval,
            slow: config.slow_interval,
            provisioning: config.provisioning_interval,
            grace: config.grace_window,
        }
    }

    /// Coarser fast tier for list views that poll many resources.
    pub fn list(config: &PollingConfig) -> Self {
        Self {
            fast: config.list_fast_interval,
            ..Self::detail(config)
        }
    }

    pub fn for_scope(config: &PollingConfig, scope: ViewScope) -> Self {
        match scope {
            ViewScope::Detail => Self::detail(config),
            ViewScope::List => Self::list(config),
        }
    }

    pub fn cadence(&self, tracker: &ActivityTracker, now: Instant) -> Cadence {
        if tracker.recently_active(now, self.grace) {
            Cadence::Fast
        } else if tracker.provisioning() {
            Cadence::Provisioning
        } else {
            Cadence::Slow
        }
    }

    pub fn interval(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Fast => self.fast,
            Cadence::Provisioning => self.provisioning,
            Cadence::Slow => self.slow,
        }
    }
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self::detail(&PollingConfig::default())
    }
}

/// Remembers the current activity signal and when it last went idle.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    current: Activity,
    went_idle_at: Option<Instant>,
}

impl ActivityTracker {
    /// Record the latest signal. Returns true if `active` flipped.
    pub fn observe(&mut self, activity: Activity, now: Instant) -> bool {
        let flipped = self.current.active != activity.active;
        if self.current.active && !activity.active {
            self.went_idle_at = Some(now);
        }
        if activity.active {
            self.went_idle_at = None;
        }
        self.current = activity;
        flipped
    }

    pub fn is_active(&self) -> bool {
        self.current.active
    }

    pub fn provisioning(&self) -> bool {
        self.current.provisioning
    }

    /// When activity last went from active to inactive, if it has since.
    pub fn went_idle_at(&self) -> Option<Instant> {
        self.went_idle_at
    }

    /// Active now, or went idle less than `grace` ago.
    pub fn recently_active(&self, now: Instant, grace: Duration) -> bool {
        self.current.active
            || self
                .went_idle_at
                .is_some_and(|idle| now.saturating_duration_since(idle) < grace)
    }
}
