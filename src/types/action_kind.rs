// ABOUTME: User-initiated actions the sync core can track optimistically.
// ABOUTME: Each kind is confirmed by a different entity family in the snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Deploy the latest revision. Confirmed by a live Deploy.
    Deploy,
    /// Publish routing rules. Confirmed by a live RuleDeploy.
    PublishRules,
}

impl ActionKind {
    /// Path below `/{resource}/{id}/` that submits this action.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            ActionKind::Deploy => "deploy",
            ActionKind::PublishRules => "rules/publish",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Deploy => "deploy",
            ActionKind::PublishRules => "publish-rules",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
