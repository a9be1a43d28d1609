// ABOUTME: Latest-entity selection per (resource, environment).
// ABOUTME: Orders by startedAt, then createdAt, then updatedAt; ties keep list order.

use chrono::{DateTime, Utc};

use super::model::{Deploy, RuleDeploy};
use crate::types::{Environment, ResourceId};

/// Something that can be ranked by recency and scoped to a resource.
pub trait Timeline {
    fn resource_id(&self) -> &ResourceId;
    fn environment(&self) -> &Environment;
    fn started_at(&self) -> Option<DateTime<Utc>>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// `startedAt ?? createdAt ?? updatedAt`.
    fn recency(&self) -> Option<DateTime<Utc>> {
        self.started_at()
            .or_else(|| self.created_at())
            .or_else(|| self.updated_at())
    }
}

impl Timeline for Deploy {
    fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    fn environment(&self) -> &Environment {
        &self.environment
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Timeline for RuleDeploy {
    fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    fn environment(&self) -> &Environment {
        &self.environment
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Pick the most recent entry for `(resource, environment)`.
///
/// Entries without any timestamp rank below every timestamped entry. On a
/// tie the entry listed first wins.
pub fn latest<'a, T: Timeline>(
    entries: &'a [T],
    resource: &ResourceId,
    environment: &Environment,
) -> Option<&'a T> {
    let mut best: Option<&'a T> = None;
    for entry in entries
        .iter()
        .filter(|e| e.resource_id() == resource && e.environment() == environment)
    {
        match best {
            Some(current) if entry.recency() <= current.recency() => {}
            _ => best = Some(entry),
        }
    }
    best
}
