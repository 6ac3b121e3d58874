//! First-run dependency installer shown over the downloader page

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::commands::{YtdlpApi, EVT_DEPS_PROGRESS};
use crate::core::config::SettingsStore;
use crate::core::error_handling::Feature;
use crate::core::listener::{watch_command, EventFlow};
use crate::core::models::AppResult;
use crate::core::progress::{DepsProgress, DepsStatus, DepsTracker};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A previous run already finished the installation
    AlreadyInstalled,
    Installed,
}

pub struct DepsInstaller {
    api: YtdlpApi,
    settings: SettingsStore,
    event_timeout: Option<Duration>,
    progress: DepsProgress,
    error: Option<String>,
}

impl DepsInstaller {
    pub fn new(state: &AppState) -> Self {
        Self {
            api: state.ytdlp.clone(),
            settings: state.settings.clone(),
            event_timeout: state.settings.get().bridge.event_timeout(),
            progress: DepsProgress::default(),
            error: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.settings.get().deps.installation_completed
    }

    pub fn progress(&self) -> &DepsProgress {
        &self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ask the host to install the dependencies and follow
    /// `ytdlp_deps_progress` until a terminal step. Completion is remembered
    /// so later runs skip straight to [`InstallOutcome::AlreadyInstalled`].
    pub async fn install<F>(&mut self, mut on_progress: F) -> AppResult<InstallOutcome>
    where
        F: FnMut(&DepsProgress),
    {
        if self.is_completed() {
            debug!("Dependencies already installed, skipping");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        self.error = None;
        let progress = &mut self.progress;
        let mut tracker = DepsTracker::new();
        let result = watch_command(
            self.api.bridge(),
            &[EVT_DEPS_PROGRESS],
            "get_dependencies",
            self.api.get_dependencies(),
            self.event_timeout,
            |event| {
                let update = match event.payload_as::<DepsProgress>() {
                    Ok(update) => update,
                    Err(e) => {
                        warn!("Ignoring malformed progress payload: {}", e);
                        return EventFlow::Continue;
                    }
                };
                debug!("Dependency step: {} ({}%)", update.step, update.percentage);
                on_progress(&update);

                let status = tracker.observe(&update);
                *progress = update;
                match status {
                    DepsStatus::Running => EventFlow::Continue,
                    DepsStatus::Completed => EventFlow::Done(()),
                    DepsStatus::Failed(message) => EventFlow::Failed(message),
                }
            },
        )
        .await;

        if let Err(e) = result {
            error!("Error installing dependencies: {}", e);
            self.error = Some(e.user_message(Feature::Dependencies));
            return Err(e);
        }

        self.settings.update(|c| {
            c.deps.installation_completed = true;
            c.deps.completed_at = Some(Utc::now());
        })?;
        info!("✅ Dependencies installed");
        Ok(InstallOutcome::Installed)
    }
}
