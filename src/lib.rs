//! Toolbox UI - Client Library
//!
//! Client side of the toolbox: the YouTube downloader, the watch-along timer
//! and the settings and splash screens. All work is delegated to a host
//! process reached through a [`HostBridge`].

pub mod commands;
pub mod core;
pub mod utils;
pub mod views;

// Re-export commonly used types
pub use core::{
    bridge::{HostBridge, HostEvent, SharedBridge},
    config::{AppConfig, SettingsStore},
    listener::{watch_command, EventFlow, EventListener},
    models::{AppError, AppResult, VideoInfo, VideoType},
    runtime::{channel_bridge, ChannelBridge, HostEndpoint},
    video_type::{classify, validate_for_download},
};

use std::sync::Arc;

use commands::{AppApi, TimerApi, YtdlpApi};

/// State shared by every page
#[derive(Clone)]
pub struct AppState {
    pub bridge: SharedBridge,
    pub settings: SettingsStore,
    pub app: AppApi,
    pub ytdlp: YtdlpApi,
    pub timer: TimerApi,
}

impl AppState {
    pub fn new(bridge: SharedBridge, settings: SettingsStore) -> Self {
        let retry = settings.get().bridge.retry_policy();

        Self {
            app: AppApi::new(bridge.clone()),
            ytdlp: YtdlpApi::new(bridge.clone(), retry.clone()),
            timer: TimerApi::new(bridge.clone(), retry),
            bridge,
            settings,
        }
    }

    /// Build the state on top of an in-process channel bridge sized and
    /// timed by the settings. The returned endpoint is the host side.
    pub fn connect(settings: SettingsStore) -> (Self, HostEndpoint) {
        let bridge_config = settings.get().bridge;
        let (bridge, endpoint) = channel_bridge(bridge_config.channel_capacity);
        let bridge = bridge.with_command_timeout(bridge_config.command_timeout());

        (Self::new(Arc::new(bridge), settings), endpoint)
    }

    /// Open the settings file in the platform config directory, or keep
    /// them in memory when no such directory exists.
    pub fn load_or_initialize_settings() -> SettingsStore {
        match AppConfig::get_config_path() {
            Ok(path) => SettingsStore::open(path),
            Err(err) => {
                tracing::warn!(
                    "Failed to resolve configuration path: {}. Settings will not persist",
                    err
                );
                SettingsStore::in_memory(AppConfig::default())
            }
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the default filter
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing(None);

    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}

/// Initialize logging at the level stored in the settings
pub fn init_with_settings(settings: &SettingsStore) -> anyhow::Result<()> {
    let level = settings.get().advanced.log_level;
    utils::logging::init_tracing(Some(&level));

    tracing::info!("📚 {} v{} initialized (log level {})", NAME, VERSION, level);
    Ok(())
}
