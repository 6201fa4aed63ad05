//! Command implementations.

mod devices;
mod run;
mod validate;

pub use devices::run_devices;
pub use run::run_session;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::SessionBlueprint;
use tracing::info;

/// Load `path`, or the built-in rig defaults when no file is given
fn load_blueprint(path: Option<&Path>) -> Result<SessionBlueprint> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            info!("No configuration file, using built-in defaults");
            config_loader::ConfigLoader::defaults().context("Built-in defaults are invalid")
        }
    }
}
