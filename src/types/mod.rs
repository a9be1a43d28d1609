// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod action_kind;
mod environment;
mod id;
mod resource_kind;
mod target;

pub use action_kind::ActionKind;
pub use environment::{Environment, EnvironmentError};
pub use id::{DeployId, Id, ResourceId, RuleDeployId, RuleId};
pub use resource_kind::{ResourceKind, ResourceKindError};
pub use target::{Target, ViewScope};
