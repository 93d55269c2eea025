//! # Configuration Management Module
//!
//! This module handles the runtime configuration of the Taleloom player,
//! providing typed settings with defaults and TOML persistence.
//!
//! ## Configuration Structure
//!
//! The configuration is organized into logical sections:
//!
//! - [`GameConfig`] - Story presentation and world seeding
//! - [`StorageConfig`] - Save file locations
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taleloom::config::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!     println!("Saves live in {}", config.storage.save_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! Taleloom uses TOML format for human-readable configuration:
//!
//! ```toml
//! [game]
//! title = "Taleloom"
//! autosave = true
//!
//! [storage]
//! save_dir = "saves"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Story presentation and world seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Title shown on the banner when a session starts.
    #[serde(default = "default_title")]
    pub title: String,
    /// Fixed RNG seed for reproducible sessions. Unset means seed from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Write the save file after every action.
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

/// Save file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory save files are written into. Created on demand.
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
    /// File name inside `save_dir` used by default.
    #[serde(default = "default_save_file")]
    pub save_file: String,
}

/// Log level and optional log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level when no `-v` flags are given: "error", "warn", "info", "debug", "trace".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append log lines to this file instead of stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_title() -> String {
    "Taleloom".to_string()
}

fn default_autosave() -> bool {
    true
}

fn default_save_dir() -> String {
    "saves".to_string()
}

fn default_save_file() -> String {
    "story.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            title: default_title(),
            seed: None,
            autosave: default_autosave(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            save_dir: default_save_dir(),
            save_file: default_save_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            game: GameConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Full path of the default save file, ensuring the directory exists.
    pub fn save_path(&self) -> Result<PathBuf> {
        let dir = Path::new(&self.storage.save_dir);
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow!("Failed to create save dir {}: {}", dir.display(), e))?;
        }
        Ok(dir.join(&self.storage.save_file))
    }

    /// Parse the configured log level, falling back to `Info` on unknown names.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.logging.level.to_ascii_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[game]\ntitle = \"Lanternshore\"\n").unwrap();
        assert_eq!(config.game.title, "Lanternshore");
        assert!(config.game.autosave);
        assert_eq!(config.storage.save_dir, "saves");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.storage.save_file, config.storage.save_file);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }
}
