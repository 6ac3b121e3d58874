//! Event names emitted by the host process.
//! Keep these in sync with the host's emitters.

pub const EVT_DEPS_PROGRESS: &str = "ytdlp_deps_progress";
pub const EVT_DOWNLOAD_PROGRESS: &str = "download_progress";
pub const EVT_DOWNLOAD_COMPLETE: &str = "download_complete";
pub const EVT_DOWNLOAD_ERROR: &str = "download_error";
pub const EVT_TIME_UPDATE: &str = "time_update";
pub const EVT_EPISODE_UPDATE: &str = "episode_update";
