//! Outbound command wrappers
//!
//! Each wrapper serializes its arguments into one host command and decodes the
//! answer. Commands are grouped by feature.

pub mod app;
pub mod events;
pub mod timer;
pub mod ytdlp;

pub use app::AppApi;
pub use events::*;
pub use timer::TimerApi;
pub use ytdlp::YtdlpApi;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::bridge::{invoke_typed, SharedBridge};
use crate::core::error_handling::{retry_async, RetryPolicy};
use crate::core::models::AppResult;

/// Invoke an idempotent command, retrying transient failures
pub(crate) async fn invoke_with_retry<T>(
    bridge: &SharedBridge,
    policy: &RetryPolicy,
    command: &'static str,
    args: Value,
) -> AppResult<T>
where
    T: DeserializeOwned + Send + 'static,
{
    retry_async(policy, command, |_attempt| {
        let bridge = bridge.clone();
        let args = args.clone();
        Box::pin(async move { invoke_typed(bridge.as_ref(), command, args).await })
    })
    .await
}
