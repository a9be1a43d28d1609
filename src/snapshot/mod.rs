// ABOUTME: Snapshot model: the canonical state of a tracked resource.
// ABOUTME: Read-only queries used by the poll cadence, reconciler, and presentation.

mod latest;
mod model;

pub use latest::{Timeline, latest};
pub use model::{Deploy, Resource, Rule, RuleDeploy, Snapshot};

use crate::status::{self, Lifecycle};
use crate::types::Environment;

impl Snapshot {
    /// Parse a snapshot from a JSON payload.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The most recent deploy for this resource in `environment`.
    pub fn latest_deploy(&self, environment: &Environment) -> Option<&Deploy> {
        latest(&self.deploys, &self.resource.id, environment)
    }

    /// The most recent rule publication for this resource in `environment`.
    pub fn latest_rule_deploy(&self, environment: &Environment) -> Option<&RuleDeploy> {
        latest(&self.rule_deploys, &self.resource.id, environment)
    }

    pub fn has_live_deploy(&self, environment: &Environment) -> bool {
        self.deploys.iter().any(|d| {
            d.resource_id == self.resource.id && &d.environment == environment && d.status.is_live()
        })
    }

    pub fn has_live_rule_deploy(&self, environment: &Environment) -> bool {
        self.rule_deploys.iter().any(|d| {
            d.resource_id == self.resource.id && &d.environment == environment && d.status.is_live()
        })
    }

    /// Any work in flight for `environment`.
    pub fn has_live_activity(&self, environment: &Environment) -> bool {
        self.has_live_deploy(environment) || self.has_live_rule_deploy(environment)
    }

    pub fn is_provisioning(&self) -> bool {
        self.resource
            .status
            .as_deref()
            .is_some_and(status::is_provisioning)
    }

    /// Status strings outside the known vocabulary, deduplicated, in order
    /// of first appearance.
    pub fn unrecognized_statuses(&self) -> Vec<String> {
        let deploys = self
            .deploys
            .iter()
            .filter(|d| !d.status.is_recognized())
            .map(|d| d.status.as_str());
        let rule_deploys = self
            .rule_deploys
            .iter()
            .filter(|d| !d.status.is_recognized())
            .map(|d| d.status.as_str());

        let mut seen: Vec<String> = Vec::new();
        for raw in deploys.chain(rule_deploys) {
            if !seen.iter().any(|s| s == raw) {
                seen.push(raw.to_string());
            }
        }
        seen
    }
}
