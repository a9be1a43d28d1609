// ABOUTME: The identity of a tracked resource: kind, id, environment, and view scope.
// ABOUTME: Any change to a Target is an identity change and forces a full resync.

use super::{Environment, ResourceId, ResourceKind};
use std::fmt;

/// Which view is tracking the resource. Only affects polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewScope {
    /// A single resource's detail view.
    #[default]
    Detail,
    /// A list view polling many resources at once.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub kind: ResourceKind,
    pub id: ResourceId,
    pub environment: Environment,
    pub scope: ViewScope,
}

impl Target {
    pub fn new(kind: ResourceKind, id: ResourceId, environment: Environment) -> Self {
        Self {
            kind,
            id,
            environment,
            scope: ViewScope::Detail,
        }
    }

    /// A detail-view target for the default "services" collection.
    pub fn service(id: impl Into<String>, environment: Environment) -> Self {
        Self::new(ResourceKind::default(), ResourceId::new(id), environment)
    }

    pub fn with_scope(mut self, scope: ViewScope) -> Self {
        self.scope = scope;
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.kind, self.id, self.environment)
    }
}
