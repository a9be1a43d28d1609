// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates resource kinds at parse time.

use serde::Deserialize;

use crate::types::ResourceKind;

pub fn deserialize_resource_kind<'de, D>(deserializer: D) -> Result<ResourceKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ResourceKind::new(&s).map_err(serde::de::Error::custom)
}
