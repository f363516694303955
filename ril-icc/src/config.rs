//! Runtime settings
//!
//! Read from a JSON file. The path is taken from the caller, then the
//! `RIL_ICC_CONFIG` environment variable, then `ril-icc/config.json` under
//! the user configuration directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pdu::NationalLanguage;
use crate::stk::DEFAULT_TERMINAL_PROFILE;

/// Custom serde module for base64 encoding of byte vectors
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Vec::new());
        }
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

pub const CONFIG_ENV_VAR: &str = "RIL_ICC_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_terminal_profile() -> Vec<u8> {
    DEFAULT_TERMINAL_PROFILE.to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IccConfig {
    /// Locking table for 7-bit text written in terminal responses
    #[serde(default)]
    pub language: NationalLanguage,
    /// Single shift table for the same
    #[serde(default)]
    pub language_shift: NationalLanguage,
    #[serde(with = "base64_bytes", default = "default_terminal_profile")]
    pub terminal_profile: Vec<u8>,
    /// Log every outgoing parcel
    #[serde(default)]
    pub debug: bool,
}

impl Default for IccConfig {
    fn default() -> Self {
        Self {
            language: NationalLanguage::Default,
            language_shift: NationalLanguage::Default,
            terminal_profile: default_terminal_profile(),
            debug: false,
        }
    }
}

impl IccConfig {
    const DEFAULT_CONFIG_FILE: &'static str = "config.json";

    /// Path used when the caller gives none
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("ril-icc").join(Self::DEFAULT_CONFIG_FILE))
    }

    /// Load settings, falling back to the defaults when the file is missing
    /// or unreadable
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = IccConfig::load(Some(&temp_dir.path().join("config.json")));
        assert_eq!(config, IccConfig::default());
        assert_eq!(config.terminal_profile, DEFAULT_TERMINAL_PROFILE.to_vec());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = IccConfig {
            language: NationalLanguage::Turkish,
            language_shift: NationalLanguage::Spanish,
            terminal_profile: vec![0xDE, 0xAD, 0xBE, 0xEF],
            debug: true,
        };
        config.save(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("3q2+7w==")); // base64 of DEADBEEF
        assert!(json.contains("\"turkish\""));

        assert_eq!(IccConfig::load(Some(&path)), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "debug": true }"#).unwrap();

        let config = IccConfig::load(Some(&path));
        assert!(config.debug);
        assert_eq!(config.language, NationalLanguage::Default);
        assert_eq!(config.terminal_profile, DEFAULT_TERMINAL_PROFILE.to_vec());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(IccConfig::from_file(&path), Err(ConfigError::Json(_))));
        assert_eq!(IccConfig::load(Some(&path)), IccConfig::default());
    }

    #[test]
    fn test_env_var_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("env.json");
        fs::write(&path, r#"{ "terminal_profile": "AQI=" }"#).unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &path);
        let config = IccConfig::load(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(config.terminal_profile, vec![0x01, 0x02]);
    }
}
