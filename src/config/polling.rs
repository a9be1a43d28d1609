// ABOUTME: Poll cadence and optimistic-action timing configuration.
// ABOUTME: All intervals are policy, not protocol, and default to empirically tuned values.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Interval while work is in flight (detail view).
    #[serde(default = "default_fast_interval", with = "humantime_serde")]
    pub fast_interval: Duration,

    /// Interval while work is in flight (list view polling many resources).
    #[serde(default = "default_list_fast_interval", with = "humantime_serde")]
    pub list_fast_interval: Duration,

    /// Interval while idle.
    #[serde(default = "default_slow_interval", with = "humantime_serde")]
    pub slow_interval: Duration,

    /// Idle interval while the resource is still provisioning.
    #[serde(default = "default_provisioning_interval", with = "humantime_serde")]
    pub provisioning_interval: Duration,

    /// How long fast polling continues after activity ends.
    #[serde(default = "default_grace_window", with = "humantime_serde")]
    pub grace_window: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            fast_interval: default_fast_interval(),
            list_fast_interval: default_list_fast_interval(),
            slow_interval: default_slow_interval(),
            provisioning_interval: default_provisioning_interval(),
            grace_window: default_grace_window(),
        }
    }
}

fn default_fast_interval() -> Duration {
    Duration::from_millis(2500)
}

fn default_list_fast_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_slow_interval() -> Duration {
    Duration::from_secs(20)
}

fn default_provisioning_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_grace_window() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimisticConfig {
    /// How long an unconfirmed action may stay pending.
    #[serde(default = "default_optimistic_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for OptimisticConfig {
    fn default() -> Self {
        Self {
            timeout: default_optimistic_timeout(),
        }
    }
}

fn default_optimistic_timeout() -> Duration {
    Duration::from_secs(20)
}
