//! Event listeners and the one-shot subscribe/trigger/dispose pattern

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::bridge::{EventHandler, HostEvent, ListenerId, SharedBridge};
use crate::core::models::{AppError, AppResult};

/// A subscription to one named event stream.
///
/// `stop` is the disposer: the first call after `listen` releases the
/// registration, any further call only logs.
pub struct EventListener {
    bridge: SharedBridge,
    event: String,
    id: Mutex<Option<ListenerId>>,
}

impl EventListener {
    pub fn new(bridge: SharedBridge, event: impl Into<String>) -> Self {
        Self {
            bridge,
            event: event.into(),
            id: Mutex::new(None),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn is_listening(&self) -> bool {
        self.id.lock().is_some()
    }

    /// Register `handler`. A previous registration of this listener is
    /// released first so a listener never holds two subscriptions.
    pub async fn listen<F>(&self, handler: F) -> AppResult<()>
    where
        F: Fn(HostEvent) + Send + Sync + 'static,
    {
        if let Some(previous) = self.id.lock().take() {
            debug!("Replacing existing '{}' subscription", self.event);
            self.bridge.unlisten(previous);
        }

        let handler: EventHandler = Arc::new(handler);
        let id = self.bridge.listen(&self.event, handler).await?;
        *self.id.lock() = Some(id);
        Ok(())
    }

    /// Release the subscription. Returns true if one was released.
    pub fn stop(&self) -> bool {
        match self.id.lock().take() {
            Some(id) => {
                self.bridge.unlisten(id);
                debug!("Stopped listening to '{}'", self.event);
                true
            }
            None => {
                warn!("No listener to stop for '{}'", self.event);
                false
            }
        }
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        if let Some(id) = self.id.get_mut().take() {
            self.bridge.unlisten(id);
        }
    }
}

/// What a one-shot watcher should do with an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventFlow<T> {
    /// Not terminal, keep waiting
    Continue,
    /// Terminal success
    Done(T),
    /// Terminal failure reported by the host through an event
    Failed(String),
}

/// Subscribe to `events`, wait for every subscription to be live, then run
/// `trigger` (the command that makes the host emit them). Each received event
/// goes through `classify` until one is terminal. All subscriptions are
/// released exactly once, whatever the outcome.
pub async fn watch_command<T, R, Fut, C>(
    bridge: &SharedBridge,
    events: &[&str],
    command: &str,
    trigger: Fut,
    timeout: Option<Duration>,
    mut classify: C,
) -> AppResult<T>
where
    Fut: Future<Output = AppResult<R>>,
    C: FnMut(&HostEvent) -> EventFlow<T>,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<HostEvent>();

    let listeners: Vec<EventListener> = events
        .iter()
        .map(|event| EventListener::new(bridge.clone(), *event))
        .collect();

    // A failed registration drops the whole vector, which releases the others.
    try_join_all(listeners.iter().map(|listener| {
        let sender = tx.clone();
        listener.listen(move |host_event| {
            let _ = sender.send(host_event);
        })
    }))
    .await?;
    drop(tx);

    let dispose = |listeners: &[EventListener]| {
        for listener in listeners {
            listener.stop();
        }
    };

    let deadline = timeout.map(|t| Instant::now() + t);

    info!("Issuing '{}' with {} listener(s) live", command, listeners.len());
    if let Err(err) = trigger.await {
        warn!("'{}' failed: {}", command, err);
        dispose(&listeners);
        return Err(err);
    }

    loop {
        let next = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    dispose(&listeners);
                    return Err(AppError::Timeout(format!(
                        "terminal event of '{}'",
                        command
                    )));
                }
            },
            None => rx.recv().await,
        };

        let Some(host_event) = next else {
            dispose(&listeners);
            return Err(AppError::Bridge(format!(
                "Event stream closed while waiting for '{}'",
                command
            )));
        };

        match classify(&host_event) {
            EventFlow::Continue => continue,
            EventFlow::Done(value) => {
                debug!("'{}' finished on '{}'", command, host_event.event);
                dispose(&listeners);
                return Ok(value);
            }
            EventFlow::Failed(message) => {
                dispose(&listeners);
                return Err(AppError::Rejected {
                    command: command.to_string(),
                    message,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::channel_bridge;
    use serde_json::json;

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (bridge, _host) = channel_bridge(4);
        let shared: SharedBridge = Arc::new(bridge.clone());

        let listener = EventListener::new(shared, "time_update");
        assert!(!listener.stop());

        listener.listen(|_| {}).await.unwrap();
        assert!(listener.is_listening());
        assert_eq!(bridge.listener_count("time_update"), 1);

        assert!(listener.stop());
        assert!(!listener.stop());
        assert_eq!(bridge.listener_count("time_update"), 0);
    }

    #[tokio::test]
    async fn test_relisten_replaces_subscription() {
        let (bridge, _host) = channel_bridge(4);
        let shared: SharedBridge = Arc::new(bridge.clone());

        let listener = EventListener::new(shared, "episode_update");
        listener.listen(|_| {}).await.unwrap();
        listener.listen(|_| {}).await.unwrap();
        assert_eq!(bridge.listener_count("episode_update"), 1);

        drop(listener);
        assert_eq!(bridge.listener_count("episode_update"), 0);
    }

    #[tokio::test]
    async fn test_watch_command_disposes_on_rejection() {
        let (bridge, mut host) = channel_bridge(4);
        let shared: SharedBridge = Arc::new(bridge.clone());

        tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            request.respond(Err("choco missing".into()));
        });

        let result: AppResult<()> = watch_command(
            &shared,
            &["ytdlp_deps_progress"],
            "get_dependencies",
            shared.invoke("get_dependencies", json!({})),
            None,
            |_| EventFlow::Continue,
        )
        .await;

        assert!(matches!(result, Err(AppError::Rejected { .. })));
        assert_eq!(bridge.listener_count("ytdlp_deps_progress"), 0);
    }

    #[tokio::test]
    async fn test_watch_command_times_out() {
        let (bridge, mut host) = channel_bridge(4);
        let shared: SharedBridge = Arc::new(bridge.clone());

        tokio::spawn(async move {
            while let Some(request) = host.next_request().await {
                request.respond(Ok(serde_json::Value::Null));
            }
        });

        let result: AppResult<()> = watch_command(
            &shared,
            &["download_complete"],
            "download_video_command",
            shared.invoke("download_video_command", json!({})),
            Some(Duration::from_millis(30)),
            |_| EventFlow::Continue,
        )
        .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
        assert_eq!(bridge.listener_count("download_complete"), 0);
        assert!(shared.invoke("noop", json!({})).await.is_ok());
    }
}
