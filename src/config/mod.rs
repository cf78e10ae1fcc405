pub mod builder;
pub mod defaults;
pub mod merge;
pub mod types;


pub use builder::ConfigBuilder;
pub use types::*;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::CONFIG_FILENAME;

static GLOBAL_CONFIG: OnceCell<Config> = OnceCell::new();

/// Main configuration loading function
pub fn load_config(config_file: &Path) -> Result<ConfigInput> {
    if !config_file.exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read {}", config_file.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", config_file.display()))
}

/// Path of the configuration file: `TESTDEPS_CONFIG` or `testdeps.yaml`
pub fn config_path() -> PathBuf {
    std::env::var(builder::ENV_CONFIG_FILE)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILENAME))
}

/// Configuration shared by every container started from this process.
///
/// Resolved once from the configuration file and the environment.
pub fn global() -> Result<&'static Config> {
    GLOBAL_CONFIG.get_or_try_init(|| {
        let path = config_path();
        debug!("Loading testdeps configuration from {}", path.display());
        ConfigBuilder::new()
            .with_file(load_config(&path)?)
            .with_env(ConfigInput::from_env()?)
            .resolve()
    })
}

/// Install an explicitly resolved configuration (used by the CLI).
///
/// Has no effect once the configuration has been resolved.
pub fn set_global(config: Config) -> bool {
    GLOBAL_CONFIG.set(config).is_ok()
}

/// Timeout used by every operation that is not given one explicitly
pub fn default_timeout() -> Result<std::time::Duration> {
    Ok(global()?.connect_timeout.0)
}
