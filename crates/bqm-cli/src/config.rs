//! Persisted application configuration: a TOML-plus-`dirs` pattern where
//! a config file is optional, a missing one loads as defaults, and the
//! default location is computed from the platform config directory
//! rather than hardcoded.

use std::path::{Path, PathBuf};

use bqm_core::QueueSettings;
use bqm_mjpeg::MjpegStreamSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BqmConfig {
    #[serde(default)]
    pub default_queue_settings: QueueSettings,
    #[serde(default)]
    pub mjpeg: MjpegStreamSettings,
    #[serde(default)]
    pub workflows_path: Option<PathBuf>,
}

impl BqmConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bqm").join("config.toml"))
    }

    pub fn workflows_path(&self) -> PathBuf {
        self.workflows_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("bqm")
                .join("workflows.xml")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempdir().unwrap();
        let config = BqmConfig::from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_queue_settings, QueueSettings::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = BqmConfig::default();
        config.mjpeg.port = 9999;
        config.save(&path).unwrap();

        let reloaded = BqmConfig::from_path(&path).unwrap();
        assert_eq!(reloaded.mjpeg.port, 9999);
    }
}
