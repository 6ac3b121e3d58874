//! Settings page: theme, download folder and dependency maintenance

use tracing::{error, info};

use crate::commands::YtdlpApi;
use crate::core::config::{SettingsStore, Theme};
use crate::core::models::{AppError, AppResult};
use crate::AppState;

pub const VERIFY_DEPS_FAILED: &str = "Error verifying dependencies. Please reinstall.";
pub const DOWNLOAD_DEPS_FAILED: &str =
    "Error downloading dependencies. Please install them manually.";

pub struct SettingsPage {
    api: YtdlpApi,
    settings: SettingsStore,
    verifying: bool,
    reinstalling: bool,
    verify_error: Option<String>,
    reinstall_error: Option<String>,
}

impl SettingsPage {
    pub fn new(state: &AppState) -> Self {
        Self {
            api: state.ytdlp.clone(),
            settings: state.settings.clone(),
            verifying: false,
            reinstalling: false,
            verify_error: None,
            reinstall_error: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.settings.get().ui.theme
    }

    /// Accepts `deepsea`, `midnight` or `pastel`
    pub fn set_theme(&mut self, value: &str) -> AppResult<Theme> {
        let theme: Theme = value.parse()?;
        self.settings.update(|c| c.ui.theme = theme)?;
        info!("Theme set to {:?}", theme);
        Ok(theme)
    }

    pub fn custom_path(&self) -> Option<String> {
        self.settings.get().downloader.custom_path
    }

    /// Remember the folder picked in the host's folder dialog.
    /// `None` goes back to the host default.
    pub fn set_custom_path(&mut self, path: Option<String>) -> AppResult<()> {
        if matches!(path.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(AppError::Config(
                "Download folder must not be empty".to_string(),
            ));
        }
        self.settings.update(|c| c.downloader.custom_path = path)?;
        Ok(())
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    pub fn is_reinstalling(&self) -> bool {
        self.reinstalling
    }

    pub fn verify_error(&self) -> Option<&str> {
        self.verify_error.as_deref()
    }

    pub fn reinstall_error(&self) -> Option<&str> {
        self.reinstall_error.as_deref()
    }

    /// Returns whether both dependencies are present
    pub async fn verify_deps(&mut self) -> AppResult<bool> {
        self.verifying = true;
        self.verify_error = None;
        let result = self.api.verify_deps().await;
        self.verifying = false;

        match result {
            Ok(check) if check.all_present() => Ok(true),
            Ok(_) => {
                self.verify_error = Some(VERIFY_DEPS_FAILED.to_string());
                Ok(false)
            }
            Err(e) => {
                error!("Error verifying dependencies: {}", e);
                self.verify_error = Some(VERIFY_DEPS_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Returns whether both downloads succeeded
    pub async fn reinstall_deps(&mut self) -> AppResult<bool> {
        self.reinstalling = true;
        self.reinstall_error = None;
        let result = self.api.download_deps().await;
        self.reinstalling = false;

        match result {
            Ok(download) if download.all_succeeded() => {
                info!("✅ Dependencies reinstalled");
                Ok(true)
            }
            Ok(download) => {
                error!(
                    "Dependency download failed: ffmpeg: {}, yt-dlp: {}",
                    download.ffmpeg.message, download.ytdlp.message
                );
                self.reinstall_error = Some(DOWNLOAD_DEPS_FAILED.to_string());
                Ok(false)
            }
            Err(e) => {
                error!("Error downloading dependencies: {}", e);
                self.reinstall_error = Some(DOWNLOAD_DEPS_FAILED.to_string());
                Err(e)
            }
        }
    }
}
