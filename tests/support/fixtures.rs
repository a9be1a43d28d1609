// ABOUTME: Snapshot and target builders shared by integration tests.
// ABOUTME: Everything defaults to the "services" collection in "production".

use chrono::{DateTime, TimeZone, Utc};
use kahu::config::Config;
use kahu::snapshot::{Deploy, Resource, RuleDeploy, Snapshot};
use kahu::status::{DeployStatus, RuleDeployStatus};
use kahu::types::{DeployId, Environment, ResourceId, RuleDeployId, Target};
use std::collections::BTreeMap;

pub fn production() -> Environment {
    Environment::default()
}

pub fn staging() -> Environment {
    Environment::new("staging").unwrap()
}

pub fn target(id: &str) -> Target {
    Target::service(id, production())
}

/// Default policy with the push stream switched off.
pub fn polling_config() -> Config {
    let mut config = Config::with_endpoint("http://status.test/api");
    config.stream.enabled = false;
    config
}

pub fn streaming_config() -> Config {
    Config::with_endpoint("http://status.test/api")
}

/// Seconds after a fixed epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn snapshot(resource: &str) -> Snapshot {
    Snapshot {
        resource: Resource {
            id: ResourceId::new(resource),
            name: Some(format!("{resource}-name")),
            status: Some("running".to_string()),
            attributes: BTreeMap::new(),
        },
        deploys: Vec::new(),
        rules: Vec::new(),
        rule_deploys: Vec::new(),
    }
}

pub fn deploy(id: &str, resource: &str, status: &str) -> Deploy {
    Deploy {
        id: DeployId::new(id),
        resource_id: ResourceId::new(resource),
        environment: production(),
        status: DeployStatus::parse(status),
        started_at: None,
        created_at: None,
        updated_at: None,
        commit: None,
        branch: None,
        logs: Vec::new(),
    }
}

pub fn rule_deploy(id: &str, resource: &str, status: &str) -> RuleDeploy {
    RuleDeploy {
        id: RuleDeployId::new(id),
        resource_id: ResourceId::new(resource),
        environment: production(),
        status: RuleDeployStatus::parse(status),
        started_at: None,
        created_at: None,
        updated_at: None,
        logs: Vec::new(),
    }
}

/// `resource` with a single deploy in `status`.
pub fn with_deploy(resource: &str, status: &str) -> Snapshot {
    let mut snap = snapshot(resource);
    snap.deploys.push(deploy("d-1", resource, status));
    snap
}
