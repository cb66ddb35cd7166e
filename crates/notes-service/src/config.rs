//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for the notes service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds (default: 30 days)
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            session_lifetime_secs: default_session_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Notes file, relative to the data directory
    #[serde(default = "default_notes_file")]
    pub notes_file: String,

    /// Sessions file, relative to the data directory
    #[serde(default = "default_sessions_file")]
    pub sessions_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            notes_file: default_notes_file(),
            sessions_file: default_sessions_file(),
        }
    }
}

fn default_cookie_name() -> String {
    "notes_session".to_string()
}

fn default_session_lifetime() -> u64 {
    30 * 24 * 3600 // 30 days
}

fn default_notes_file() -> String {
    "notes.json".to_string()
}

fn default_sessions_file() -> String {
    "sessions.json".to_string()
}

impl Config {
    /// Load configuration from the data directory, writing defaults if absent
    pub fn load(data_path: &str) -> Result<Self> {
        let config_file = Path::new(data_path).join("config.json");

        if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read config file: {:?}", config_file))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| "Failed to parse config.json")?;
            tracing::info!("Loaded configuration from {:?}", config_file);
            Ok(config)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_file
            );
            let config = Config::default();

            std::fs::create_dir_all(data_path)
                .with_context(|| format!("Failed to create data directory: {}", data_path))?;

            // Write default config for reference
            let content = serde_json::to_string_pretty(&config)?;
            std::fs::write(&config_file, content)
                .with_context(|| format!("Failed to write default config: {:?}", config_file))?;
            tracing::info!("Created default config at {:?}", config_file);

            Ok(config)
        }
    }

    pub fn notes_path(&self, data_path: &str) -> PathBuf {
        Path::new(data_path).join(&self.storage.notes_file)
    }

    pub fn sessions_path(&self, data_path: &str) -> PathBuf {
        Path::new(data_path).join(&self.storage.sessions_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data");
        let data_path = data_path.to_str().unwrap();

        let config = Config::load(data_path).unwrap();
        assert_eq!(config.session.cookie_name, "notes_session");
        assert!(Path::new(data_path).join("config.json").exists());

        // Second load reads the file it just wrote.
        let reloaded = Config::load(data_path).unwrap();
        assert_eq!(reloaded.storage.notes_file, "notes.json");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "session": { "cookie_name": "sid" } }"#,
        )
        .unwrap();

        let config = Config::load(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.session_lifetime_secs, 30 * 24 * 3600);
        assert_eq!(config.storage.sessions_file, "sessions.json");
    }
}
