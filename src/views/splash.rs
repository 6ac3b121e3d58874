//! Splash screen: make sure ffmpeg and yt-dlp are present, then hand over to
//! the main window.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::commands::{AppApi, YtdlpApi};
use crate::core::error_handling::Feature;
use crate::core::models::AppResult;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SplashStep {
    Verifying = 1,
    Downloading = 2,
    Ready = 3,
}

impl SplashStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Verifying => "Verifying dependencies",
            Self::Downloading => "Downloading dependencies",
            Self::Ready => "Initializing",
        }
    }
}

pub struct SplashController {
    app: AppApi,
    ytdlp: YtdlpApi,
    step: SplashStep,
    error: Option<String>,
}

impl SplashController {
    pub fn new(state: &AppState) -> Self {
        Self {
            app: state.app.clone(),
            ytdlp: state.ytdlp.clone(),
            step: SplashStep::Verifying,
            error: None,
        }
    }

    pub fn step(&self) -> SplashStep {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the checkmark of `step` is lit
    pub fn is_reached(&self, step: SplashStep) -> bool {
        self.step >= step
    }

    /// Run the dependency check. The main window is invoked whatever the
    /// outcome; only a failure to invoke it is returned.
    pub async fn run(&mut self) -> AppResult<SplashStep> {
        if let Err(e) = self.handle_dependencies().await {
            error!("Dependency check failed: {}", e);
            self.error = Some(e.user_message(Feature::Dependencies));
        }

        self.app.invoke_main_window().await?;
        Ok(self.step)
    }

    async fn handle_dependencies(&mut self) -> AppResult<()> {
        self.step = SplashStep::Verifying;
        let check = self.ytdlp.verify_deps().await?;
        if check.all_present() {
            self.step = SplashStep::Ready;
            return Ok(());
        }

        info!(
            "Missing dependencies (ffmpeg: {}, yt-dlp: {})",
            check.ffmpeg, check.ytdlp
        );
        self.step = SplashStep::Downloading;
        let download = self.ytdlp.download_deps().await?;
        if download.all_succeeded() {
            self.step = SplashStep::Ready;
        } else {
            warn!(
                "Dependency download incomplete: ffmpeg: {}, yt-dlp: {}",
                download.ffmpeg.message, download.ytdlp.message
            );
            self.error = Some(Feature::Dependencies.failure_message().to_string());
        }
        Ok(())
    }
}
