//! Application configuration management
//!
//! Everything the pages remember between runs lives here: the download
//! folder and toggles, the theme, whether the dependency installer already
//! finished, and the bridge timeouts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::error_handling::RetryPolicy;
use crate::core::models::{AppError, AppResult, VideoFormat};

/// Main application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub downloader: DownloaderSettings,
    #[serde(default)]
    pub deps: DepsState,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Downloader page settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DownloaderSettings {
    /// Download folder chosen by the user; the host default is used when unset
    pub custom_path: Option<String>,
    pub audio_only: bool,
    pub video_only: bool,
    pub unique_folders: bool,
    pub download_thumbnail: bool,
    pub write_url_link: bool,
}

impl DownloaderSettings {
    pub fn format(&self) -> VideoFormat {
        VideoFormat::from_flags(self.audio_only, self.video_only)
    }
}

/// Dependency installer bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DepsState {
    pub installation_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    DeepSea,
    Midnight,
    Pastel,
}

impl std::str::FromStr for Theme {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "deepsea" => Ok(Self::DeepSea),
            "midnight" => Ok(Self::Midnight),
            "pastel" => Ok(Self::Pastel),
            other => Err(AppError::Config(format!("Unknown theme: {}", other))),
        }
    }
}

/// UI-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub theme: Theme,
}

/// Bridge timeouts and retries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    pub channel_capacity: usize,
    /// Seconds to wait for a command's answer; no limit when unset
    pub command_timeout_secs: Option<u64>,
    /// Seconds to wait for the terminal event of a one-shot watch
    pub event_timeout_secs: Option<u64>,
    /// Attempts for idempotent reads
    pub retry_attempts: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            command_timeout_secs: Some(30),
            event_timeout_secs: None,
            retry_attempts: 3,
        }
    }
}

impl BridgeConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn event_timeout(&self) -> Option<Duration> {
        self.event_timeout_secs.map(Duration::from_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.retry_attempts)
    }
}

/// Advanced configuration options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvancedConfig {
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load configuration from `config_path`, creating it if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Save configuration to `config_path`
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::debug!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "toolbox", "toolbox-ui")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Export configuration as JSON string
    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to export configuration")
    }

    /// Parse and validate configuration from a JSON string. Nothing is saved.
    pub fn import(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse imported configuration")?;

        config
            .validate()
            .with_context(|| "Imported configuration is invalid")?;

        tracing::info!("Imported and validated configuration from JSON");
        Ok(config)
    }

    /// Write a timestamped copy next to `config_path`
    pub fn backup(&self, config_path: &Path) -> Result<PathBuf> {
        let backup_path = config_path.with_extension(format!(
            "backup.{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));

        std::fs::write(&backup_path, self.export()?)
            .with_context(|| format!("Failed to create backup: {:?}", backup_path))?;

        tracing::info!("Created configuration backup: {:?}", backup_path);
        Ok(backup_path)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.downloader.audio_only && self.downloader.video_only {
            anyhow::bail!("Audio-only and video-only cannot both be enabled");
        }

        if let Some(ref path) = self.downloader.custom_path {
            if path.trim().is_empty() {
                anyhow::bail!("Custom download path must not be empty");
            }
        }

        if self.bridge.channel_capacity == 0 || self.bridge.channel_capacity > 4096 {
            anyhow::bail!("Bridge channel capacity should be between 1 and 4096");
        }

        if self.bridge.command_timeout_secs == Some(0) {
            anyhow::bail!("Command timeout must be greater than 0");
        }

        if self.bridge.event_timeout_secs == Some(0) {
            anyhow::bail!("Event timeout must be greater than 0");
        }

        if self.bridge.retry_attempts == 0 || self.bridge.retry_attempts > 10 {
            anyhow::bail!("Retry attempts should be between 1 and 10");
        }

        if !["error", "warn", "info", "debug", "trace"].contains(&self.advanced.log_level.as_str())
        {
            anyhow::bail!(
                "Invalid log level: must be 'error', 'warn', 'info', 'debug', or 'trace'"
            );
        }

        Ok(())
    }
}

/// Shared, optionally persisted configuration used by the pages
#[derive(Clone)]
pub struct SettingsStore {
    config: Arc<RwLock<AppConfig>>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// A store that never touches the disk
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            path: None,
        }
    }

    /// Load from `path`, falling back to defaults when the file is invalid
    pub fn open(path: PathBuf) -> Self {
        let config = match AppConfig::load_from(&path) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(err) => {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    AppConfig::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {}. Using defaults",
                    err
                );
                AppConfig::default()
            }
        };

        Self {
            config: Arc::new(RwLock::new(config)),
            path: Some(path),
        }
    }

    /// Snapshot of the current configuration
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Apply `change`, validate, and persist. The change is discarded when
    /// validation fails.
    pub fn update<F>(&self, change: F) -> AppResult<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        change(&mut candidate);
        candidate
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if let Some(ref path) = self.path {
            candidate
                .save_to(path)
                .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        }

        *self.config.write() = candidate.clone();
        Ok(candidate)
    }

    /// Restore defaults. The dependency installer state survives the reset.
    pub fn reset(&self) -> AppResult<AppConfig> {
        tracing::info!("Resetting configuration to defaults");
        self.update(|c| {
            let deps = std::mem::take(&mut c.deps);
            *c = AppConfig {
                deps,
                ..AppConfig::default()
            };
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ui.theme, Theme::DeepSea);
        assert!(!config.deps.installation_completed);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = config.export().unwrap();
        assert!(json.contains("\"deepsea\""));

        let parsed_config = AppConfig::import(&json).unwrap();
        assert_eq!(config, parsed_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::import(r#"{"ui":{"theme":"pastel"}}"#).unwrap();
        assert_eq!(config.ui.theme, Theme::Pastel);
        assert_eq!(config.bridge, BridgeConfig::default());
    }

    #[test]
    fn test_invalid_config_validation() {
        let mut config = AppConfig::default();
        config.downloader.audio_only = true;
        config.downloader.video_only = true;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.bridge.retry_attempts = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.advanced.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.downloader.custom_path = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_store_persists_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let store = SettingsStore::open(path.clone());
        store
            .update(|c| c.downloader.custom_path = Some("/media/videos".to_string()))
            .unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(
            reloaded.downloader.custom_path.as_deref(),
            Some("/media/videos")
        );
    }

    #[test]
    fn test_store_rejects_invalid_update() {
        let store = SettingsStore::in_memory(AppConfig::default());
        let result = store.update(|c| {
            c.downloader.audio_only = true;
            c.downloader.video_only = true;
        });

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(!store.get().downloader.audio_only);
    }

    #[test]
    fn test_reset_keeps_installer_state() {
        let store = SettingsStore::in_memory(AppConfig::default());
        store
            .update(|c| {
                c.ui.theme = Theme::Pastel;
                c.deps.installation_completed = true;
            })
            .unwrap();

        let config = store.reset().unwrap();
        assert_eq!(config.ui.theme, Theme::DeepSea);
        assert!(config.deps.installation_completed);
    }

    #[test]
    fn test_store_falls_back_on_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::open(path);
        assert_eq!(store.get(), AppConfig::default());
    }

    #[test]
    fn test_backup_is_written_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let backup = AppConfig::default().backup(&path).unwrap();
        assert!(backup.exists());
        assert_eq!(backup.parent(), path.parent());
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("midnight".parse::<Theme>().unwrap(), Theme::Midnight);
        assert!("neon".parse::<Theme>().is_err());
    }
}
