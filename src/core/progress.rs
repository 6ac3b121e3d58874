//! Progress payload parsing
//!
//! The host forwards raw yt-dlp progress lines on `download_progress` and
//! structured records on `ytdlp_deps_progress`; this module turns both into
//! values the pages can render.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::models::{AppError, AppResult};

/// Step name the host sends once every dependency is installed
pub const DEPS_COMPLETED_STEP: &str = "All installations completed";

/// Download progress as shown under the progress bar
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DownloadProgress {
    /// Percentage as printed by yt-dlp, e.g. `42.5%`
    pub downloaded: String,
    pub percentage: f64,
    /// Total size, e.g. `10.00MiB`
    pub total: String,
    /// Speed, e.g. `1.23MiB/s`
    pub speed: String,
    /// Remaining time, `MM:SS` or `HH:MM:SS`
    pub eta: String,
}

fn progress_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\[download\]\s+([\d.]+%)\s+of\s+~?\s*([\d.]+[KMG]?i?B)\s+at\s+([\d.]+[KMG]?i?B/s)\s+ETA\s+(\d{2}:\d{2}(?::\d{2})?)",
        )
        .expect("progress regex is valid")
    })
}

impl DownloadProgress {
    /// Parse one yt-dlp progress line; `None` for any other output.
    pub fn parse_line(line: &str) -> Option<Self> {
        let Some(captures) = progress_line_regex().captures(line) else {
            debug!("No progress in line: {}", line);
            return None;
        };

        let downloaded = captures[1].to_string();
        let percentage = downloaded.trim_end_matches('%').parse::<f64>().ok()?;

        Some(Self {
            downloaded,
            percentage: percentage.clamp(0.0, 100.0),
            total: captures[2].to_string(),
            speed: captures[3].to_string(),
            eta: captures[4].to_string(),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.percentage >= 100.0
    }
}

/// Step name of the final record of an aborted installation
pub const DEPS_EXITING_STEP: &str = "Exiting...";

/// Error attached to a `ytdlp_deps_progress` record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressError {
    pub step: String,
    pub error: String,
}

impl ProgressError {
    /// The host keeps installing ffmpeg and yt-dlp after a Chocolatey failure
    pub fn is_recoverable(&self) -> bool {
        self.step.starts_with("Chocolatey")
    }
}

/// Payload of `ytdlp_deps_progress`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DepsProgress {
    pub step: String,
    pub percentage: f64,
    pub eta: String,
    #[serde(default)]
    pub error: Option<ProgressError>,
}

impl DepsProgress {
    pub fn is_completed(&self) -> bool {
        self.step == DEPS_COMPLETED_STEP
    }

    pub fn is_exiting(&self) -> bool {
        self.step == DEPS_EXITING_STEP
    }
}

/// Where an installation run stands after a record
#[derive(Debug, Clone, PartialEq)]
pub enum DepsStatus {
    Running,
    Completed,
    /// Carries the last error the host reported, or the step name
    Failed(String),
}

/// Folds the records of one installation run into a [`DepsStatus`].
///
/// `All installations completed` ends the run. `Exiting...` ends it too,
/// unless the last error came from the Chocolatey stage, after which the
/// host goes on with ffmpeg and yt-dlp. Any other record at 100% counts as
/// completion.
#[derive(Debug, Default)]
pub struct DepsTracker {
    last_error: Option<ProgressError>,
}

impl DepsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_error(&self) -> Option<&ProgressError> {
        self.last_error.as_ref()
    }

    pub fn observe(&mut self, update: &DepsProgress) -> DepsStatus {
        if let Some(ref error) = update.error {
            debug!("Dependency step '{}' failed: {}", error.step, error.error);
            self.last_error = Some(error.clone());
            return DepsStatus::Running;
        }

        if update.is_completed() {
            return DepsStatus::Completed;
        }

        if update.is_exiting() {
            return match self.last_error.take() {
                Some(error) if error.is_recoverable() => {
                    debug!("Continuing after '{}' failure", error.step);
                    DepsStatus::Running
                }
                Some(error) => DepsStatus::Failed(error.error),
                None => DepsStatus::Failed(update.step.clone()),
            };
        }

        if update.percentage >= 100.0 {
            DepsStatus::Completed
        } else {
            DepsStatus::Running
        }
    }
}

/// Parse a `MM:SS` clock
pub fn parse_clock(value: &str) -> AppResult<(u32, u32)> {
    let invalid = || AppError::Parse(format!("Invalid clock value: '{}'", value));

    let (minutes, seconds) = value.trim().split_once(':').ok_or_else(invalid)?;
    let minutes = minutes.parse::<u32>().map_err(|_| invalid())?;
    let seconds = seconds.parse::<u32>().map_err(|_| invalid())?;

    if seconds >= 60 {
        return Err(invalid());
    }
    Ok((minutes, seconds))
}

/// Format a clock as zero-padded `MM:SS`
pub fn format_clock(minutes: u32, seconds: u32) -> String {
    format!("{:02}:{:02}", minutes, seconds)
}
