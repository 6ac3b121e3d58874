//! Watch-along timer page
//!
//! The host owns the clock and the episode counter; this page mirrors them.
//! While the timer runs the clock follows `time_update` and every button
//! except stop is refused. The episode follows `episode_update` from the
//! first `load` until the page is dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::commands::{TimerApi, EVT_EPISODE_UPDATE, EVT_TIME_UPDATE};
use crate::core::bridge::HostEvent;
use crate::core::error_handling::Feature;
use crate::core::listener::EventListener;
use crate::core::models::{AppError, AppResult, WatchalongSnapshot};
use crate::core::progress::{format_clock, parse_clock};
use crate::AppState;

pub struct WatchAlongPage {
    api: TimerApi,
    state: Arc<Mutex<WatchalongSnapshot>>,
    time_listener: EventListener,
    episode_listener: EventListener,
    running: bool,
    error: Option<String>,
}

impl WatchAlongPage {
    pub fn new(state: &AppState) -> Self {
        let bridge = state.timer.bridge().clone();
        Self {
            api: state.timer.clone(),
            state: Arc::new(Mutex::new(WatchalongSnapshot::default())),
            time_listener: EventListener::new(bridge.clone(), EVT_TIME_UPDATE),
            episode_listener: EventListener::new(bridge, EVT_EPISODE_UPDATE),
            running: false,
            error: None,
        }
    }

    pub fn snapshot(&self) -> WatchalongSnapshot {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Episode line and zero-padded clock, as displayed
    pub fn display(&self) -> (String, String) {
        let snapshot = self.snapshot();
        (
            format!("Episode: {}", snapshot.episode),
            format_clock(snapshot.minutes, snapshot.seconds),
        )
    }

    /// Read episode and clock from the host file
    pub async fn load(&mut self) -> AppResult<WatchalongSnapshot> {
        if !self.episode_listener.is_listening() {
            let episode = Arc::clone(&self.state);
            self.episode_listener
                .listen(move |event| apply_episode_update(&episode, &event))
                .await?;
        }

        let result = self.api.read_file().await;
        match result {
            Ok(snapshot) => {
                *self.state.lock() = snapshot;
                Ok(snapshot)
            }
            Err(e) => Err(self.fail("reading file", e)),
        }
    }

    pub async fn start(&mut self) -> AppResult<()> {
        if self.running {
            return Err(AppError::TimerRunning);
        }

        let clock = Arc::clone(&self.state);
        self.time_listener
            .listen(move |event| apply_time_update(&clock, &event))
            .await?;

        if let Err(e) = self.api.start_timer().await {
            self.time_listener.stop();
            return Err(self.fail("starting timer", e));
        }

        self.running = true;
        self.error = None;
        Ok(())
    }

    /// Stop the host timer and release the clock subscription. The page
    /// leaves the running state even when the host refuses.
    pub async fn stop(&mut self) -> AppResult<()> {
        let result = self.api.stop_timer().await;
        self.running = false;
        if self.time_listener.is_listening() {
            self.time_listener.stop();
        }

        match result {
            Ok(()) => {
                info!("Timer stopped successfully");
                Ok(())
            }
            Err(e) => Err(self.fail("stopping timer", e)),
        }
    }

    pub async fn add_episode(&mut self) -> AppResult<()> {
        self.ensure_stopped()?;
        let before = self.snapshot().episode;
        if let Err(e) = self.api.add_episode().await {
            return Err(self.fail("adding episode", e));
        }
        self.settle_episode(before, before + 1);
        Ok(())
    }

    /// Returns false without calling the host when already at episode 1
    pub async fn dec_episode(&mut self) -> AppResult<bool> {
        self.ensure_stopped()?;
        if self.snapshot().episode <= 1 {
            debug!("Episode is already 1");
            return Ok(false);
        }
        let before = self.snapshot().episode;
        if let Err(e) = self.api.dec_episode().await {
            return Err(self.fail("removing episode", e));
        }
        self.settle_episode(before, before - 1);
        Ok(true)
    }

    pub async fn reset_timer(&mut self) -> AppResult<WatchalongSnapshot> {
        self.ensure_stopped()?;
        if let Err(e) = self.api.reset_timer().await {
            return Err(self.fail("resetting timer", e));
        }
        self.load().await
    }

    pub async fn reset_file(&mut self) -> AppResult<WatchalongSnapshot> {
        self.ensure_stopped()?;
        if let Err(e) = self.api.reset_file().await {
            return Err(self.fail("resetting file", e));
        }
        self.load().await
    }

    fn ensure_stopped(&self) -> AppResult<()> {
        if self.running {
            Err(AppError::TimerRunning)
        } else {
            Ok(())
        }
    }

    /// Apply `expected` unless `episode_update` already moved the counter
    fn settle_episode(&self, before: i64, expected: i64) {
        let mut snapshot = self.state.lock();
        if snapshot.episode == before {
            snapshot.episode = expected;
        }
    }

    fn fail(&mut self, action: &str, e: AppError) -> AppError {
        error!("Error {}: {}", action, e);
        self.error = Some(e.user_message(Feature::Timer));
        e
    }
}

fn apply_time_update(state: &Mutex<WatchalongSnapshot>, event: &HostEvent) {
    let Some(clock) = event.payload.as_str() else {
        warn!("Unexpected time_update payload: {}", event.payload);
        return;
    };
    match parse_clock(clock) {
        Ok((minutes, seconds)) => {
            let mut snapshot = state.lock();
            snapshot.minutes = minutes;
            snapshot.seconds = seconds;
        }
        Err(e) => warn!("{}", e),
    }
}

fn apply_episode_update(state: &Mutex<WatchalongSnapshot>, event: &HostEvent) {
    let episode = match &event.payload {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match episode {
        Some(episode) => state.lock().episode = episode,
        None => warn!("Unexpected episode_update payload: {}", event.payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str, payload: Value) -> HostEvent {
        HostEvent {
            event: name.to_string(),
            id: 1,
            payload,
        }
    }

    #[test]
    fn test_time_update_keeps_episode() {
        let state = Mutex::new(WatchalongSnapshot {
            episode: 3,
            minutes: 0,
            seconds: 0,
        });
        apply_time_update(&state, &event(EVT_TIME_UPDATE, json!("12:07")));

        let snapshot = *state.lock();
        assert_eq!(snapshot.episode, 3);
        assert_eq!((snapshot.minutes, snapshot.seconds), (12, 7));
    }

    #[test]
    fn test_malformed_updates_are_ignored() {
        let state = Mutex::new(WatchalongSnapshot::default());
        apply_time_update(&state, &event(EVT_TIME_UPDATE, json!(42)));
        apply_time_update(&state, &event(EVT_TIME_UPDATE, json!("7:75")));
        apply_episode_update(&state, &event(EVT_EPISODE_UPDATE, json!(null)));

        assert_eq!(*state.lock(), WatchalongSnapshot::default());
    }

    #[test]
    fn test_episode_update_accepts_numbers_and_strings() {
        let state = Mutex::new(WatchalongSnapshot::default());
        apply_episode_update(&state, &event(EVT_EPISODE_UPDATE, json!(5)));
        assert_eq!(state.lock().episode, 5);
        apply_episode_update(&state, &event(EVT_EPISODE_UPDATE, json!("6")));
        assert_eq!(state.lock().episode, 6);
    }
}
