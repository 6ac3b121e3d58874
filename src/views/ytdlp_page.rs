//! YouTube downloader page
//!
//! Holds the URL field, the fetched video card, the download settings dialog
//! and the progress bar. Every side effect goes through [`YtdlpApi`].

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::commands::{AppApi, YtdlpApi, EVT_DOWNLOAD_COMPLETE, EVT_DOWNLOAD_ERROR, EVT_DOWNLOAD_PROGRESS};
use crate::core::config::SettingsStore;
use crate::core::error_handling::Feature;
use crate::core::listener::{watch_command, EventFlow};
use crate::core::models::{AppError, AppResult, DownloadRequest, VideoInfo, VideoType};
use crate::core::progress::DownloadProgress;
use crate::core::video_type::validate_for_download;
use crate::AppState;

/// Window size that fits the video card
const CARD_WIDTH: f64 = 860.0;
const CARD_HEIGHT: f64 = 600.0;

pub struct YtdlpPage {
    api: YtdlpApi,
    app: AppApi,
    settings: SettingsStore,
    event_timeout: Option<Duration>,
    url: String,
    video_type: Option<VideoType>,
    error: Option<String>,
    video_info: Option<VideoInfo>,
    searching: bool,
    download_data: DownloadProgress,
    download_started: bool,
    download_complete: bool,
}

impl YtdlpPage {
    pub fn new(state: &AppState) -> Self {
        Self {
            api: state.ytdlp.clone(),
            app: state.app.clone(),
            settings: state.settings.clone(),
            event_timeout: state.settings.get().bridge.event_timeout(),
            url: String::new(),
            video_type: None,
            error: None,
            video_info: None,
            searching: false,
            download_data: DownloadProgress::default(),
            download_started: false,
            download_complete: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_type(&self) -> Option<VideoType> {
        self.video_type
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn video_info(&self) -> Option<&VideoInfo> {
        self.video_info.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn download_data(&self) -> &DownloadProgress {
        &self.download_data
    }

    pub fn is_downloading(&self) -> bool {
        self.download_started
    }

    pub fn is_download_complete(&self) -> bool {
        self.download_complete
    }

    /// Update the URL field. The error line follows the classification;
    /// an empty field clears it. A different URL drops the fetched card, so
    /// it has to be searched again before it can be downloaded.
    pub fn set_url(&mut self, url: impl Into<String>) -> Option<VideoType> {
        let url = url.into();
        if url != self.url {
            self.video_info = None;
            self.download_complete = false;
        }
        self.url = url;

        if self.url.trim().is_empty() {
            self.video_type = None;
            self.error = None;
            return None;
        }

        match validate_for_download(&self.url) {
            Ok(video_type) => {
                self.video_type = Some(video_type);
                self.error = None;
            }
            Err(e) => {
                debug!("URL refused: {}", e);
                self.video_type = None;
                self.error = Some(e.user_message(Feature::Fetch));
            }
        }
        self.video_type
    }

    pub fn can_search(&self) -> bool {
        self.video_type.is_some() && !self.searching && !self.download_started
    }

    /// Fetch the video card for the current URL
    pub async fn search(&mut self) -> AppResult<&VideoInfo> {
        if let Err(e) = validate_for_download(&self.url) {
            self.error = Some(e.user_message(Feature::Fetch));
            return Err(e);
        }
        if self.download_started {
            return Err(AppError::InvalidState(
                "A download is in progress".to_string(),
            ));
        }

        self.searching = true;
        let result = self.api.fetch_video(&self.url).await;
        self.searching = false;

        match result {
            Ok(info) => {
                info!("Found '{}' by {}", info.title, info.uploader);
                if let Err(e) = self.app.resize_window(CARD_WIDTH, CARD_HEIGHT).await {
                    warn!("Could not resize window for the video card: {}", e);
                }
                self.error = None;
                self.download_complete = false;
                Ok(&*self.video_info.insert(info))
            }
            Err(e) => {
                error!("Error fetching video info: {}", e);
                self.error = Some(e.user_message(Feature::Fetch));
                self.video_info = None;
                Err(e)
            }
        }
    }

    /// Audio-only and video-only exclude each other; enabling one while the
    /// other is on is refused.
    pub fn set_audio_only(&mut self, enabled: bool) -> AppResult<()> {
        if enabled && self.settings.get().downloader.video_only {
            return Err(AppError::InvalidState(
                "Video-only is enabled".to_string(),
            ));
        }
        self.settings.update(|c| c.downloader.audio_only = enabled)?;
        Ok(())
    }

    pub fn set_video_only(&mut self, enabled: bool) -> AppResult<()> {
        if enabled && self.settings.get().downloader.audio_only {
            return Err(AppError::InvalidState(
                "Audio-only is enabled".to_string(),
            ));
        }
        self.settings.update(|c| c.downloader.video_only = enabled)?;
        Ok(())
    }

    pub fn set_unique_folders(&mut self, enabled: bool) -> AppResult<()> {
        self.settings.update(|c| c.downloader.unique_folders = enabled)?;
        Ok(())
    }

    pub fn set_download_thumbnail(&mut self, enabled: bool) -> AppResult<()> {
        self.settings
            .update(|c| c.downloader.download_thumbnail = enabled)?;
        Ok(())
    }

    pub fn set_write_url_link(&mut self, enabled: bool) -> AppResult<()> {
        self.settings.update(|c| c.downloader.write_url_link = enabled)?;
        Ok(())
    }

    /// The folder picked by the user, or the host's default download folder
    pub async fn download_path(&self) -> AppResult<String> {
        match self.settings.get().downloader.custom_path {
            Some(path) => Ok(path),
            None => self.api.get_default_download_path().await,
        }
    }

    pub async fn download(&mut self) -> AppResult<()> {
        self.download_with(|_| {}).await
    }

    /// Start the download and follow it to its terminal event.
    /// `on_progress` sees every parsed progress line.
    pub async fn download_with<F>(&mut self, mut on_progress: F) -> AppResult<()>
    where
        F: FnMut(&DownloadProgress),
    {
        if self.download_started {
            return Err(AppError::InvalidState(
                "A download is already running".to_string(),
            ));
        }
        if self.video_info.is_none() {
            return Err(AppError::InvalidState(
                "Search for a video first".to_string(),
            ));
        }
        if let Err(e) = validate_for_download(&self.url) {
            self.error = Some(e.user_message(Feature::Download));
            return Err(e);
        }

        let request = match self.build_request().await {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message(Feature::Download));
                return Err(e);
            }
        };

        self.download_started = true;
        self.download_complete = false;
        self.download_data = DownloadProgress::default();

        let download_data = &mut self.download_data;
        let result = watch_command(
            self.api.bridge(),
            &[EVT_DOWNLOAD_PROGRESS, EVT_DOWNLOAD_COMPLETE, EVT_DOWNLOAD_ERROR],
            "download_video_command",
            self.api.download_video(&request),
            self.event_timeout,
            |event| match event.event.as_str() {
                EVT_DOWNLOAD_PROGRESS => {
                    match event.payload.as_str().and_then(DownloadProgress::parse_line) {
                        Some(progress) => {
                            on_progress(&progress);
                            *download_data = progress;
                        }
                        None => debug!("No match found in progress payload"),
                    }
                    EventFlow::Continue
                }
                EVT_DOWNLOAD_COMPLETE => EventFlow::Done(()),
                EVT_DOWNLOAD_ERROR => EventFlow::Failed(
                    event
                        .payload
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| event.payload.to_string()),
                ),
                other => {
                    warn!("Unexpected event '{}'", other);
                    EventFlow::Continue
                }
            },
        )
        .await;

        self.download_started = false;
        self.download_data = DownloadProgress::default();

        match result {
            Ok(()) => {
                info!("✅ Download finished: {}", self.url);
                self.download_complete = true;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!("Error downloading video: {}", e);
                self.error = Some(e.user_message(Feature::Download));
                Err(e)
            }
        }
    }

    async fn build_request(&self) -> AppResult<DownloadRequest> {
        let downloader = self.settings.get().downloader;
        let path = self.download_path().await?;

        Ok(DownloadRequest {
            url: self.url.clone(),
            path,
            unique_folders: downloader.unique_folders,
            download_thumbnail: downloader.download_thumbnail,
            write_url_link: downloader.write_url_link,
            format: Some(downloader.format().wire_value().to_string()),
        })
    }
}
