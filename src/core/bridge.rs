//! Host process bridge
//!
//! The host process owns every side effect: dependency installation, video
//! downloads and the watch-along file. This layer reaches it through two
//! primitives only: an outbound command call and an inbound named-event
//! subscription.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::models::AppResult;

/// One occurrence of a named event emitted by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostEvent {
    /// Event name, e.g. `download_progress`
    pub event: String,
    /// Sequence number assigned by the emitting endpoint
    pub id: u64,
    pub payload: Value,
}

impl HostEvent {
    /// Decode the payload into `T`
    pub fn payload_as<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Handle identifying a live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Callback invoked once per event occurrence
pub type EventHandler = Arc<dyn Fn(HostEvent) + Send + Sync>;

/// Client side of the host bridge.
///
/// Delivery is best-effort: per event name in emission order, with no
/// ordering across names, no replay and no back-pressure.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Issue a command. `args` is a JSON object of primitive values.
    async fn invoke(&self, command: &str, args: Value) -> AppResult<Value>;

    /// Register `handler` for `event`. Returns once the registration is live,
    /// so events emitted afterwards are guaranteed to reach it.
    async fn listen(&self, event: &str, handler: EventHandler) -> AppResult<ListenerId>;

    /// Remove a registration. Returns false when `id` was not registered.
    fn unlisten(&self, id: ListenerId) -> bool;
}

/// Shared bridge handle used by the command wrappers and the pages
pub type SharedBridge = Arc<dyn HostBridge>;

/// Issue a command and decode its success value
pub async fn invoke_typed<T: DeserializeOwned>(
    bridge: &dyn HostBridge,
    command: &str,
    args: Value,
) -> AppResult<T> {
    let value = bridge.invoke(command, args).await?;
    Ok(serde_json::from_value(value)?)
}

/// Empty argument record
pub fn no_args() -> Value {
    Value::Object(serde_json::Map::new())
}
