// ABOUTME: Status classifier mapping raw status strings to lifecycle categories.
// ABOUTME: Pure lookup tables for deploys, rule deploys, and resource provisioning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle category of a status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Work still in progress. Blocks repeat actions and requires fast polling.
    Live,
    /// Completed and serving.
    Succeeded,
    /// Ended without success.
    Failed,
    /// Not part of the known vocabulary.
    Unrecognized,
}

/// Common classification surface shared by both status vocabularies.
pub trait Lifecycle {
    fn phase(&self) -> Phase;

    fn is_live(&self) -> bool {
        self.phase() == Phase::Live
    }

    fn is_terminal_success(&self) -> bool {
        self.phase() == Phase::Succeeded
    }

    fn is_terminal_failure(&self) -> bool {
        self.phase() == Phase::Failed
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase(), Phase::Succeeded | Phase::Failed)
    }

    /// Whether a second action of the same kind must be refused.
    fn blocks_new_actions(&self) -> bool {
        self.is_live()
    }

    fn is_recognized(&self) -> bool {
        self.phase() != Phase::Unrecognized
    }
}

/// Fold case and separators so "Rolling-Out" and "rolling_out" compare equal.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Status of a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeployStatus {
    Queued,
    Pending,
    Scheduling,
    Building,
    Pushing,
    Deploying,
    Validating,
    RollingOut,
    InProgress,
    Success,
    Failed,
    Cancelled,
    TimedOut,
    RolledBack,
    Superseded,
    /// A value outside the known vocabulary, kept verbatim.
    Unknown(String),
}

impl DeployStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "queued" => Self::Queued,
            "pending" => Self::Pending,
            "scheduling" => Self::Scheduling,
            "building" => Self::Building,
            "pushing" => Self::Pushing,
            "deploying" => Self::Deploying,
            "validating" => Self::Validating,
            "rolling_out" => Self::RollingOut,
            "in_progress" => Self::InProgress,
            "success" | "succeeded" | "deployed" => Self::Success,
            "failed" | "error" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            "timed_out" => Self::TimedOut,
            "rolled_back" => Self::RolledBack,
            "superseded" => Self::Superseded,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Scheduling => "scheduling",
            Self::Building => "building",
            Self::Pushing => "pushing",
            Self::Deploying => "deploying",
            Self::Validating => "validating",
            Self::RollingOut => "rolling_out",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::RolledBack => "rolled_back",
            Self::Superseded => "superseded",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Lifecycle for DeployStatus {
    fn phase(&self) -> Phase {
        match self {
            Self::Queued
            | Self::Pending
            | Self::Scheduling
            | Self::Building
            | Self::Pushing
            | Self::Deploying
            | Self::Validating
            | Self::RollingOut
            | Self::InProgress => Phase::Live,
            Self::Success => Phase::Succeeded,
            Self::Failed
            | Self::Cancelled
            | Self::TimedOut
            | Self::RolledBack
            | Self::Superseded => Phase::Failed,
            Self::Unknown(_) => Phase::Unrecognized,
        }
    }
}

impl From<String> for DeployStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<DeployStatus> for String {
    fn from(status: DeployStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a routing-rule publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleDeployStatus {
    Queued,
    Pending,
    InProgress,
    Publishing,
    Published,
    Failed,
    Cancelled,
    Unknown(String),
}

impl RuleDeployStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "queued" => Self::Queued,
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "publishing" => Self::Publishing,
            "published" | "success" | "succeeded" => Self::Published,
            "failed" | "error" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Lifecycle for RuleDeployStatus {
    fn phase(&self) -> Phase {
        match self {
            Self::Queued | Self::Pending | Self::InProgress | Self::Publishing => Phase::Live,
            Self::Published => Phase::Succeeded,
            Self::Failed | Self::Cancelled => Phase::Failed,
            Self::Unknown(_) => Phase::Unrecognized,
        }
    }
}

impl From<String> for RuleDeployStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<RuleDeployStatus> for String {
    fn from(status: RuleDeployStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RuleDeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// String-level entry points over the deploy vocabulary.

pub fn is_live(status: &str) -> bool {
    DeployStatus::parse(status).is_live()
}

pub fn is_terminal_success(status: &str) -> bool {
    DeployStatus::parse(status).is_terminal_success()
}

pub fn is_terminal_failure(status: &str) -> bool {
    DeployStatus::parse(status).is_terminal_failure()
}

pub fn blocks_new_actions(status: &str) -> bool {
    DeployStatus::parse(status).blocks_new_actions()
}

/// Whether a resource status denotes early provisioning (no runtime yet).
pub fn is_provisioning(status: &str) -> bool {
    matches!(
        normalize(status).as_str(),
        "provisioning" | "creating" | "pending" | "initializing"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_separators() {
        assert_eq!(normalize(" Rolling-Out "), "rolling_out");
        assert_eq!(normalize("IN PROGRESS"), "in_progress");
    }

    #[test]
    fn unknown_keeps_raw_value() {
        let status = DeployStatus::parse("Warming");
        assert_eq!(status, DeployStatus::Unknown("Warming".to_string()));
        assert_eq!(status.as_str(), "Warming");
    }
}
