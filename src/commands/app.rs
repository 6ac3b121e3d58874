//! Application-level commands

use serde_json::json;
use tracing::info;

use crate::core::bridge::{invoke_typed, no_args, SharedBridge};
use crate::core::models::AppResult;

#[derive(Clone)]
pub struct AppApi {
    bridge: SharedBridge,
}

impl AppApi {
    pub fn new(bridge: SharedBridge) -> Self {
        Self { bridge }
    }

    /// Show the main window once the splash screen is done
    pub async fn invoke_main_window(&self) -> AppResult<()> {
        info!("🪟 Invoking main window");
        self.bridge.invoke("invoke_main_window", no_args()).await?;
        Ok(())
    }

    pub async fn get_version(&self) -> AppResult<String> {
        invoke_typed(self.bridge.as_ref(), "get_version", no_args()).await
    }

    pub async fn resize_window(&self, width: f64, height: f64) -> AppResult<()> {
        info!("Resizing window to {}x{}", width, height);
        self.bridge
            .invoke("resize_window", json!({ "width": width, "height": height }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::channel_bridge;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_resize_window_sends_dimensions() {
        let (bridge, mut host) = channel_bridge(4);
        let api = AppApi::new(Arc::new(bridge));

        let host_task = tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            assert_eq!(request.command, "resize_window");
            assert_eq!(request.args["width"], 1280.0);
            assert_eq!(request.args["height"], 720.0);
            request.respond(Ok(serde_json::Value::Null));
        });

        api.resize_window(1280.0, 720.0).await.unwrap();
        host_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_version_rejects_non_string() {
        let (bridge, mut host) = channel_bridge(4);
        let api = AppApi::new(Arc::new(bridge));

        tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            request.respond(Ok(json!(42)));
        });

        assert!(api.get_version().await.is_err());
    }
}
