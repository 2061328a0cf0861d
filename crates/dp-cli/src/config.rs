//! Console configuration
//!
//! One JSON document; every field is optional and falls back to its default.
//!
//! ```json
//! {
//!   "provider": { "enabled": true, "endpoint": "http://127.0.0.1:3000/api/random", "timeout_ms": 10000 },
//!   "storage":  { "dir": "/var/lib/doorprize", "key": "doorprize-storage" },
//!   "reveal":   { "profile": "stage", "stagger_step_ms": 500 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dp_core::StorageConfig;
use dp_draw::RevealTiming;
use dp_random::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "DOORPRIZE_CONFIG";

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "doorprize.config.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorprizeConfig {
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
    pub reveal: RevealTiming,
}

impl DoorprizeConfig {
    /// `--config` flag, then `DOORPRIZE_CONFIG`, then `./doorprize.config.json`, then defaults
    pub fn load(flag: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let cwd = std::env::current_dir().context("Failed to read working directory")?;

        match locate(flag, env.as_deref(), &cwd) {
            Some(path) => Self::load_from_path(&path),
            None => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Explicit paths must exist; the working-directory file is optional
fn locate(flag: Option<&Path>, env: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = flag.or(env) {
        return Some(path.to_path_buf());
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    local.exists().then_some(local)
}
