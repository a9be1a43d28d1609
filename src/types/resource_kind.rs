// ABOUTME: Validated resource collection name used as the first URL path segment.
// ABOUTME: e.g. "services" in /services/{id}/status.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceKindError {
    #[error("resource kind cannot be empty")]
    Empty,

    #[error("invalid character in resource kind: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKind(String);

impl ResourceKind {
    pub fn new(value: &str) -> Result<Self, ResourceKindError> {
        let trimmed = value.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(ResourceKindError::Empty);
        }

        // Valid characters: lowercase alphanumeric, hyphen, underscore
        for c in trimmed.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '_' {
                return Err(ResourceKindError::InvalidChar(c));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceKind {
    fn default() -> Self {
        Self("services".to_string())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
