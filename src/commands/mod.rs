// ABOUTME: Command module aggregator for the kahu CLI.
// ABOUTME: Re-exports watch and deploy command handlers and resolves CLI targets.

mod deploy;
mod watch;

pub use deploy::deploy;
pub use watch::watch;

use crate::cli::TargetArgs;
use kahu::config::Config;
use kahu::error::{Error, Result};
use kahu::types::{Environment, ResourceId, ResourceKind, Target};

/// Build the tracking target from CLI arguments, falling back to the
/// configured resource collection.
pub fn resolve_target(args: &TargetArgs, config: &Config) -> Result<Target> {
    let kind = match &args.resource {
        Some(resource) => {
            ResourceKind::new(resource).map_err(|e| Error::InvalidArgument(e.to_string()))?
        }
        None => config.resource.clone(),
    };
    let environment =
        Environment::new(&args.environment).map_err(|e| Error::InvalidArgument(e.to_string()))?;
    if args.id.trim().is_empty() {
        return Err(Error::InvalidArgument("resource id cannot be empty".to_string()));
    }
    Ok(Target::new(kind, ResourceId::new(args.id.trim()), environment))
}
