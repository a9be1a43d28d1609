// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates kahu.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api";

pub fn init_config(dir: &Path, endpoint: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let endpoint = endpoint.unwrap_or(DEFAULT_ENDPOINT);
    if !endpoint.starts_with("http://") {
        return Err(Error::InvalidConfig(format!(
            "endpoint must be an http:// URL: {endpoint}"
        )));
    }

    std::fs::write(&config_path, generate_template_yaml(endpoint))?;

    Ok(())
}

fn generate_template_yaml(endpoint: &str) -> String {
    format!(
        r#"endpoint: {endpoint}
resource: services
request_timeout: 10s

polling:
  fast_interval: 2500ms
  list_fast_interval: 5s
  slow_interval: 20s
  provisioning_interval: 5s
  grace_window: 30s

optimistic:
  timeout: 20s

stream:
  enabled: true
  # initial_backoff: 1s
  # max_backoff: 30s
"#
    )
}
