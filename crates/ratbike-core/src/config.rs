//! Application configuration management.
//!
//! This module handles loading the configuration: where the local
//! bike store lives, how slow the simulated remote is, and whether the remote
//! starts with sample bikes.
//!
//! Configuration is stored at `~/.config/ratbike/config.json`. The
//! `RATBIKE_DATA_DIR` and `RATBIKE_REMOTE_LATENCY_MS` environment variables
//! override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/data directory paths
const APP_NAME: &str = "ratbike";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Simulated remote latency when neither the file nor the environment sets one.
/// Short enough for interactive use, long enough to notice the remote tier.
pub const DEFAULT_REMOTE_LATENCY_MS: u64 = 500;

pub const DATA_DIR_ENV: &str = "RATBIKE_DATA_DIR";
pub const REMOTE_LATENCY_ENV: &str = "RATBIKE_REMOTE_LATENCY_MS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub remote_latency_ms: Option<u64>,
    #[serde(default = "default_seed_remote")]
    pub seed_remote: bool,
}

fn default_seed_remote() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            remote_latency_ms: None,
            seed_remote: default_seed_remote(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the local bike store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Read latency of the simulated remote.
    pub fn remote_latency(&self) -> Duration {
        let from_env = std::env::var(REMOTE_LATENCY_ENV).ok();
        Duration::from_millis(resolve_latency_ms(from_env.as_deref(), self.remote_latency_ms))
    }
}

fn resolve_latency_ms(from_env: Option<&str>, from_file: Option<u64>) -> u64 {
    if let Some(raw) = from_env {
        match raw.trim().parse() {
            Ok(ms) => return ms,
            Err(_) => warn!(value = raw, "Ignoring invalid {}", REMOTE_LATENCY_ENV),
        }
    }
    from_file.unwrap_or(DEFAULT_REMOTE_LATENCY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.remote_latency_ms.is_none());
        assert!(config.seed_remote);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"data_dir": "/tmp/bikes", "remote_latency_ms": 10, "seed_remote": false}"#,
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/tmp/bikes")));
        assert_eq!(loaded.remote_latency_ms, Some(10));
        assert!(!loaded.seed_remote);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_seed_remote_defaults_when_absent() {
        let config: Config = serde_json::from_str(r#"{"data_dir": null, "remote_latency_ms": 5}"#).unwrap();
        assert!(config.seed_remote);
    }

    #[test]
    fn test_resolve_latency() {
        assert_eq!(resolve_latency_ms(None, None), DEFAULT_REMOTE_LATENCY_MS);
        assert_eq!(resolve_latency_ms(None, Some(20)), 20);
        assert_eq!(resolve_latency_ms(Some("7"), Some(20)), 7);
        assert_eq!(resolve_latency_ms(Some("soon"), Some(20)), 20);
    }
}
