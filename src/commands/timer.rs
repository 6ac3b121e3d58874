//! Watch-along timer command wrappers

use serde_json::Value;
use tracing::info;

use crate::commands::invoke_with_retry;
use crate::core::bridge::{no_args, SharedBridge};
use crate::core::error_handling::RetryPolicy;
use crate::core::models::{AppError, AppResult, WatchalongSnapshot};
use crate::core::progress::parse_clock;

#[derive(Clone)]
pub struct TimerApi {
    bridge: SharedBridge,
    retry: RetryPolicy,
}

impl TimerApi {
    pub fn new(bridge: SharedBridge, retry: RetryPolicy) -> Self {
        Self { bridge, retry }
    }

    pub fn bridge(&self) -> &SharedBridge {
        &self.bridge
    }

    /// Read episode and clock. The host answers `[episode, "MM:SS", ...]`.
    pub async fn read_file(&self) -> AppResult<WatchalongSnapshot> {
        info!("Reading file");
        let fields: Vec<String> =
            invoke_with_retry(&self.bridge, &self.retry, "read_file", no_args()).await?;
        parse_snapshot(&fields)
    }

    pub async fn start_timer(&self) -> AppResult<()> {
        info!("⏱️ Starting timer");
        self.send("start_timer").await
    }

    pub async fn stop_timer(&self) -> AppResult<()> {
        info!("Stopping timer");
        self.send("stop_timer").await
    }

    pub async fn add_episode(&self) -> AppResult<()> {
        info!("Adding episode");
        self.send("add_episode").await
    }

    pub async fn dec_episode(&self) -> AppResult<()> {
        info!("Removing episode");
        self.send("dec_episode").await
    }

    /// Zero the clock, keep the episode
    pub async fn reset_timer(&self) -> AppResult<()> {
        info!("Resetting timer");
        self.send("reset_timer").await
    }

    /// Back to episode 1 at 00:00
    pub async fn reset_file(&self) -> AppResult<()> {
        info!("Resetting file");
        self.send("reset_file").await
    }

    async fn send(&self, command: &str) -> AppResult<()> {
        let _: Value = self.bridge.invoke(command, no_args()).await?;
        Ok(())
    }
}

fn parse_snapshot(fields: &[String]) -> AppResult<WatchalongSnapshot> {
    let (episode, time) = match fields {
        [episode, time, ..] => (episode, time),
        _ => {
            return Err(AppError::Parse(format!(
                "Expected episode and time, got {} field(s)",
                fields.len()
            )))
        }
    };

    let episode = episode
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Parse(format!("Invalid episode: '{}'", episode)))?;
    let (minutes, seconds) = parse_clock(time)?;

    Ok(WatchalongSnapshot {
        episode,
        minutes,
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_snapshot() {
        let snapshot = parse_snapshot(&fields(&["4", "21:09", "resources/watchalong.txt"])).unwrap();
        assert_eq!(
            snapshot,
            WatchalongSnapshot {
                episode: 4,
                minutes: 21,
                seconds: 9
            }
        );
    }

    #[test]
    fn test_parse_snapshot_rejects_bad_payloads() {
        assert!(parse_snapshot(&fields(&["4"])).is_err());
        assert!(parse_snapshot(&fields(&["four", "00:00"])).is_err());
        assert!(parse_snapshot(&fields(&["4", "0000"])).is_err());
    }
}
