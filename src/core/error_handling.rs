//! Error classification and retry handling
//!
//! Every failed bridge call is mapped onto an [`ErrorCategory`], which decides
//! whether the call may be retried, and onto a [`Feature`], which decides the
//! message shown to the user.
//!
//! Key features:
//! - Exponential backoff with jitter
//! - Retry only for transport failures and timeouts
//! - One user-facing message per feature

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::models::{AppError, AppResult};

/// Maximum retry attempts allowed
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Default base delay for exponential backoff (100ms)
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Maximum delay cap for exponential backoff (5 seconds)
pub const MAX_DELAY_CAP: Duration = Duration::from_secs(5);

/// Error categories for bridge consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The bridge itself is unavailable (channel closed, host gone)
    Transport,
    /// The host ran the command and rejected it
    Host,
    /// No answer or no terminal event in time
    Timeout,
    /// The user typed something unusable
    Input,
    /// A payload did not have the expected shape
    Payload,
    /// The page is not in a state that allows the action
    State,
    /// Configuration could not be loaded, validated or saved
    Config,
}

impl AppError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Bridge(_) => ErrorCategory::Transport,
            Self::Rejected { .. } => ErrorCategory::Host,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::InvalidUrl(_) | Self::UnsupportedPlaylist => ErrorCategory::Input,
            Self::Payload(_) | Self::Parse(_) => ErrorCategory::Payload,
            Self::InvalidState(_) | Self::TimerRunning => ErrorCategory::State,
            Self::Config(_) | Self::Io(_) => ErrorCategory::Config,
        }
    }

    /// Transport failures and timeouts are transient; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Timeout
        )
    }

    /// Message shown to the user when this error ends an action of `feature`
    pub fn user_message(&self, feature: Feature) -> String {
        match self {
            Self::InvalidUrl(_) => "Invalid URL.".to_string(),
            Self::UnsupportedPlaylist => "Playlists cannot be downloaded.".to_string(),
            Self::TimerRunning => "Stop the timer first.".to_string(),
            _ => feature.failure_message().to_string(),
        }
    }
}

/// Feature area an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Fetch,
    Download,
    Dependencies,
    Timer,
    Settings,
}

impl Feature {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Fetch => "Could not find the video. Please check the URL.",
            Self::Download => "Could not download the video. Please try again.",
            Self::Dependencies => "Dependency error. Please reinstall the dependencies.",
            Self::Timer => "Could not update the watch-along timer.",
            Self::Settings => "Could not save the settings.",
        }
    }
}

/// Retry strategy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    /// Backoff multiplier (typically 2.0 for exponential)
    pub backoff_multiplier: f64,
    /// Add random jitter to prevent thundering herd
    pub jitter_enabled: bool,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: MAX_DELAY_CAP,
            backoff_multiplier: 2.0,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.clamp(1, MAX_RETRY_ATTEMPTS);
        self
    }

    /// Calculate delay before attempt `attempt + 1`
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let mut delay = Duration::from_millis(delay_ms as u64);

        // Apply maximum delay cap
        if delay > self.max_delay {
            delay = self.max_delay;
        }

        if self.jitter_enabled {
            let jitter =
                delay.as_millis() as f64 * self.jitter_factor * (rand::random::<f64>() - 0.5);
            let jittered_delay = delay.as_millis() as i64 + jitter as i64;
            delay = Duration::from_millis(jittered_delay.max(0) as u64);
        }

        delay
    }
}

/// Boxed future returned by a retried operation
pub type RetryFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted. The last error is returned unchanged.
pub async fn retry_async<'a, T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> AppResult<T>
where
    F: FnMut(u32) -> RetryFuture<'a, T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!("Executing attempt {} for {}", attempt, what);

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", what, attempt);
                }
                return Ok(value);
            }
            Err(error) => {
                if !error.is_retryable() || attempt >= max_attempts {
                    return Err(error);
                }

                let delay = policy.calculate_delay(attempt);
                warn!(
                    "Attempt {} of {} failed: {}. Retrying in {:?}",
                    attempt, what, error, delay
                );

                if delay > Duration::from_millis(0) {
                    sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
