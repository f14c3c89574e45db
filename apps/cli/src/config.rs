//! Process configuration.

use anyhow::{Context, Result};
use mlp_training::PublishConfig;

/// Read the object-store configuration from the environment.
///
/// Called once in `main`; the value is handed to the store and publisher,
/// nothing else reads these variables.
pub fn load_publish_config() -> Result<PublishConfig> {
    PublishConfig::from_env().context("Invalid object store configuration")
}
