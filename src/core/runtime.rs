//! In-process bridge transport.
//!
//! A thin async command queue between the client layer and whatever plays the
//! host role. Commands travel over an `mpsc` queue with a `oneshot` responder;
//! events are dispatched synchronously to the handlers registered for their
//! name at the moment of emission.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

use crate::core::bridge::{EventHandler, HostBridge, HostEvent, ListenerId};
use crate::core::models::{AppError, AppResult};

/// A command waiting for the host's answer
#[derive(Debug)]
pub struct HostRequest {
    pub command: String,
    pub args: Value,
    respond_to: oneshot::Sender<Result<Value, String>>,
}

impl HostRequest {
    /// Answer the request. Errors are opaque strings, as the host sends them.
    pub fn respond(self, result: Result<Value, String>) {
        if self.respond_to.send(result).is_err() {
            debug!("Caller of '{}' stopped waiting for the answer", self.command);
        }
    }

    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }

    pub fn arg_bool(&self, name: &str) -> Option<bool> {
        self.args.get(name).and_then(Value::as_bool)
    }
}

#[derive(Default)]
struct ListenerRegistry {
    by_event: HashMap<String, Vec<(ListenerId, EventHandler)>>,
}

impl ListenerRegistry {
    fn insert(&mut self, event: &str, id: ListenerId, handler: EventHandler) {
        self.by_event
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.by_event.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(existing, _)| *existing != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    fn snapshot(&self, event: &str) -> Vec<EventHandler> {
        self.by_event
            .get(event)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    fn count(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, Vec::len)
    }
}

/// Client half handed to the command wrappers
#[derive(Clone)]
pub struct ChannelBridge {
    sender: mpsc::Sender<HostRequest>,
    listeners: Arc<RwLock<ListenerRegistry>>,
    command_timeout: Option<Duration>,
}

/// Host half: receives commands and emits events
pub struct HostEndpoint {
    receiver: mpsc::Receiver<HostRequest>,
    emitter: HostEmitter,
}

/// Cloneable event emitter, usable from tasks spawned by the host
#[derive(Clone)]
pub struct HostEmitter {
    listeners: Arc<RwLock<ListenerRegistry>>,
    next_event_id: Arc<AtomicU64>,
}

/// Create a connected bridge pair.
pub fn channel_bridge(capacity: usize) -> (ChannelBridge, HostEndpoint) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let listeners = Arc::new(RwLock::new(ListenerRegistry::default()));

    tracing::info!("[BRIDGE] Created channel bridge (capacity {})", capacity.max(1));

    (
        ChannelBridge {
            sender: tx,
            listeners: listeners.clone(),
            command_timeout: None,
        },
        HostEndpoint {
            receiver: rx,
            emitter: HostEmitter {
                listeners,
                next_event_id: Arc::new(AtomicU64::new(1)),
            },
        },
    )
}

impl ChannelBridge {
    /// Fail commands that get no answer within `timeout`
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Number of live registrations for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().count(event)
    }
}

#[async_trait]
impl HostBridge for ChannelBridge {
    #[instrument(skip(self, args))]
    async fn invoke(&self, command: &str, args: Value) -> AppResult<Value> {
        let (tx, rx) = oneshot::channel();
        let request = HostRequest {
            command: command.to_string(),
            args,
            respond_to: tx,
        };

        self.sender
            .send(request)
            .await
            .map_err(|e| AppError::Bridge(format!("Host unavailable: {}", e)))?;

        let answer = match self.command_timeout {
            Some(timeout) => tokio::time::timeout(timeout, rx)
                .await
                .map_err(|_| AppError::Timeout(format!("command '{}'", command)))?,
            None => rx.await,
        };

        match answer {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(AppError::Rejected {
                command: command.to_string(),
                message,
            }),
            Err(_) => Err(AppError::Bridge(format!(
                "Host dropped command '{}' without answering",
                command
            ))),
        }
    }

    async fn listen(&self, event: &str, handler: EventHandler) -> AppResult<ListenerId> {
        let id = ListenerId::new();
        self.listeners.write().insert(event, id, handler);
        debug!("[BRIDGE] Listening to '{}' ({})", event, id);
        Ok(id)
    }

    fn unlisten(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(id);
        if removed {
            debug!("[BRIDGE] Removed listener {}", id);
        }
        removed
    }
}

impl HostEndpoint {
    /// Wait for the next command. `None` once every client half is dropped.
    pub async fn next_request(&mut self) -> Option<HostRequest> {
        self.receiver.recv().await
    }

    pub fn emitter(&self) -> HostEmitter {
        self.emitter.clone()
    }

    pub fn emit(&self, event: &str, payload: Value) -> usize {
        self.emitter.emit(event, payload)
    }
}

impl HostEmitter {
    /// Deliver `payload` to every handler currently registered for `event`.
    /// Returns how many handlers received it.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let handlers = self.listeners.read().snapshot(event);
        if handlers.is_empty() {
            warn!("[BRIDGE] No listener for '{}', event dropped", event);
            return 0;
        }

        let host_event = HostEvent {
            event: event.to_string(),
            id: self.next_event_id.fetch_add(1, Ordering::Relaxed),
            payload,
        };

        // Handlers run outside the registry lock so they may unlisten themselves.
        for handler in &handlers {
            handler(host_event.clone());
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_round_trip() {
        let (bridge, mut host) = channel_bridge(8);

        let host_task = tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            assert_eq!(request.command, "fetch_video");
            assert_eq!(request.arg_str("url"), Some("https://youtu.be/x"));
            request.respond(Ok(json!(["t", "mp4", "thumb", "up"])));
        });

        let value = bridge
            .invoke("fetch_video", json!({"url": "https://youtu.be/x"}))
            .await
            .unwrap();
        assert_eq!(value[1], "mp4");
        host_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_reported_with_command_name() {
        let (bridge, mut host) = channel_bridge(8);

        tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            request.respond(Err("Another download is already in progress".into()));
        });

        match bridge.invoke("download_video_command", json!({})).await {
            Err(AppError::Rejected { command, message }) => {
                assert_eq!(command, "download_video_command");
                assert!(message.contains("already in progress"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_host_is_a_transport_error() {
        let (bridge, host) = channel_bridge(8);
        drop(host);

        let result = bridge.invoke("verify_deps", json!({})).await;
        assert!(matches!(result, Err(AppError::Bridge(_))));
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let (bridge, _host) = channel_bridge(8);
        let bridge = bridge.with_command_timeout(Some(Duration::from_millis(20)));

        let result = bridge.invoke("read_file", json!({})).await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_events_are_delivered_in_emission_order() {
        let (bridge, host) = channel_bridge(8);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let id = bridge
            .listen(
                "time_update",
                Arc::new(move |event: HostEvent| sink.lock().push(event.payload)),
            )
            .await
            .unwrap();

        assert_eq!(host.emit("time_update", json!("00:01")), 1);
        assert_eq!(host.emit("time_update", json!("00:02")), 1);
        assert_eq!(host.emit("episode_update", json!("2")), 0);

        assert!(bridge.unlisten(id));
        assert!(!bridge.unlisten(id));
        assert_eq!(host.emit("time_update", json!("00:03")), 0);

        assert_eq!(*seen.lock(), vec![json!("00:01"), json!("00:02")]);
        assert_eq!(bridge.listener_count("time_update"), 0);
    }
}
