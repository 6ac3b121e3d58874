//! Core data models shared by the command wrappers and the page controllers

use serde::{Deserialize, Serialize};

/// Shape of a YouTube URL as recognized by the downloader page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VideoType {
    Clip,

    Playlist,

    Livestream,

    Video,
}

/// Output format requested from the host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum VideoFormat {
    /// mp3 extraction
    AudioOnly,

    /// mp4 without audio
    VideoOnly,

    #[default]
    VideoAndAudio,
}

impl VideoFormat {
    /// Audio-only wins when both flags are somehow set.
    pub fn from_flags(audio_only: bool, video_only: bool) -> Self {
        if audio_only {
            Self::AudioOnly
        } else if video_only {
            Self::VideoOnly
        } else {
            Self::VideoAndAudio
        }
    }

    /// Value sent in the `format` argument of `download_video_command`
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::AudioOnly => "audio",
            Self::VideoOnly => "video",
            Self::VideoAndAudio => "",
        }
    }
}

/// Video metadata returned by `fetch_video`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub title: String,

    pub ext: String,

    pub thumbnail: String,

    pub uploader: String,
}

impl From<(String, String, String, String)> for VideoInfo {
    fn from((title, ext, thumbnail, uploader): (String, String, String, String)) -> Self {
        Self {
            title,
            ext,
            thumbnail,
            uploader,
        }
    }
}

/// Arguments of `download_video_command`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,

    pub path: String,

    pub unique_folders: bool,

    pub download_thumbnail: bool,

    pub write_url_link: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Result of `verify_deps`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DependencyCheck {
    pub ffmpeg: bool,

    pub ytdlp: bool,
}

impl DependencyCheck {
    pub fn all_present(&self) -> bool {
        self.ffmpeg && self.ytdlp
    }
}

/// Outcome for one dependency in `download_deps`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyOutcome {
    pub success: bool,

    pub message: String,
}

/// Result of `download_deps`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyDownload {
    pub ffmpeg: DependencyOutcome,

    pub ytdlp: DependencyOutcome,
}

impl DependencyDownload {
    pub fn all_succeeded(&self) -> bool {
        self.ffmpeg.success && self.ytdlp.success
    }
}

/// Episode and clock read back from the host's watch-along file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchalongSnapshot {
    pub episode: i64,

    pub minutes: u32,

    pub seconds: u32,
}

impl Default for WatchalongSnapshot {
    fn default() -> Self {
        Self {
            episode: 1,
            minutes: 0,
            seconds: 0,
        }
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Command '{command}' rejected: {message}")]
    Rejected { command: String, message: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Playlist downloads are not supported")]
    UnsupportedPlaylist,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timer is running")]
    TimerRunning,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flags() {
        assert_eq!(VideoFormat::from_flags(true, false).wire_value(), "audio");
        assert_eq!(VideoFormat::from_flags(false, true).wire_value(), "video");
        assert_eq!(VideoFormat::from_flags(false, false).wire_value(), "");
        assert_eq!(VideoFormat::from_flags(true, true), VideoFormat::AudioOnly);
    }

    #[test]
    fn test_download_request_uses_host_argument_names() {
        let request = DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            path: "/tmp".to_string(),
            unique_folders: true,
            download_thumbnail: false,
            write_url_link: false,
            format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["uniqueFolders"], true);
        assert_eq!(value["downloadThumbnail"], false);
        assert_eq!(value["writeUrlLink"], false);
        assert!(value.get("format").is_none());
    }

    #[test]
    fn test_dependency_helpers() {
        assert!(!DependencyCheck { ffmpeg: true, ytdlp: false }.all_present());

        let download: DependencyDownload = serde_json::from_str(
            r#"{"ffmpeg":{"success":true,"message":"ok"},"ytdlp":{"success":true,"message":"ok"}}"#,
        )
        .unwrap();
        assert!(download.all_succeeded());
    }
}
