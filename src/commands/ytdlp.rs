//! yt-dlp command wrappers
//!
//! Typed call-throughs for the downloader commands of the host. Reads are
//! retried on transport failures; commands with side effects are sent once.

use serde_json::json;
use tracing::{error, info};

use crate::commands::invoke_with_retry;
use crate::core::bridge::{invoke_typed, no_args, SharedBridge};
use crate::core::error_handling::RetryPolicy;
use crate::core::models::{
    AppResult, DependencyCheck, DependencyDownload, DownloadRequest, VideoInfo,
};

#[derive(Clone)]
pub struct YtdlpApi {
    bridge: SharedBridge,
    retry: RetryPolicy,
}

impl YtdlpApi {
    pub fn new(bridge: SharedBridge, retry: RetryPolicy) -> Self {
        Self { bridge, retry }
    }

    pub fn bridge(&self) -> &SharedBridge {
        &self.bridge
    }

    /// Ask the host to install ffmpeg and yt-dlp. Progress arrives on
    /// `ytdlp_deps_progress`; the call itself returns immediately.
    pub async fn get_dependencies(&self) -> AppResult<()> {
        info!("📦 Verifying dependencies");
        self.bridge.invoke("get_dependencies", no_args()).await?;
        Ok(())
    }

    /// Fetch title, extension, thumbnail and uploader of `url`
    pub async fn fetch_video(&self, url: &str) -> AppResult<VideoInfo> {
        info!("📺 Getting video info for: {}", url);

        let fields: (String, String, String, String) =
            invoke_with_retry(&self.bridge, &self.retry, "fetch_video", json!({ "url": url }))
                .await
                .map_err(|e| {
                    error!("❌ Failed to get video info: {}", e);
                    e
                })?;

        Ok(fields.into())
    }

    /// Start a download. `true` means the host accepted it; the outcome
    /// arrives on `download_complete` or `download_error`.
    pub async fn download_video(&self, request: &DownloadRequest) -> AppResult<bool> {
        info!("⬇️ Downloading video: {}", request.url);
        invoke_typed(
            self.bridge.as_ref(),
            "download_video_command",
            serde_json::to_value(request)?,
        )
        .await
    }

    pub async fn get_default_download_path(&self) -> AppResult<String> {
        info!("Getting default path");
        invoke_with_retry(
            &self.bridge,
            &self.retry,
            "get_default_download_path",
            no_args(),
        )
        .await
    }

    pub async fn verify_deps(&self) -> AppResult<DependencyCheck> {
        info!("🔍 Verifying dependencies");
        invoke_with_retry(&self.bridge, &self.retry, "verify_deps", no_args()).await
    }

    pub async fn download_deps(&self) -> AppResult<DependencyDownload> {
        info!("📥 Downloading dependencies");
        invoke_typed(self.bridge.as_ref(), "download_deps", no_args()).await
    }

    /// Path of the ffmpeg binary the host installed
    pub async fn get_ffmpeg_path(&self) -> AppResult<String> {
        info!("Getting ffmpeg path");
        invoke_typed(self.bridge.as_ref(), "invoke_ffmpeg_from_local", no_args()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::AppError;
    use crate::core::runtime::channel_bridge;
    use std::sync::Arc;
    use std::time::Duration;

    fn api() -> (YtdlpApi, crate::core::runtime::HostEndpoint) {
        let (bridge, host) = channel_bridge(8);
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1),
            jitter_enabled: false,
            ..Default::default()
        };
        (YtdlpApi::new(Arc::new(bridge), policy), host)
    }

    #[tokio::test]
    async fn test_fetch_video_decodes_tuple() {
        let (api, mut host) = api();

        tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            assert_eq!(request.command, "fetch_video");
            request.respond(Ok(json!(["Title", "webm", "https://i.ytimg.com/x.jpg", "Uploader"])));
        });

        let info = api
            .fetch_video("https://www.youtube.com/watch?v=abc")
            .await
            .unwrap();
        assert_eq!(info.title, "Title");
        assert_eq!(info.ext, "webm");
        assert_eq!(info.uploader, "Uploader");
    }

    #[tokio::test]
    async fn test_download_video_sends_camel_case_args() {
        let (api, mut host) = api();

        let host_task = tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            assert_eq!(request.command, "download_video_command");
            assert_eq!(request.arg_bool("uniqueFolders"), Some(true));
            assert_eq!(request.arg_str("format"), Some("audio"));
            assert_eq!(request.arg_str("path"), Some("/downloads"));
            request.respond(Ok(json!(true)));
        });

        let accepted = api
            .download_video(&DownloadRequest {
                url: "https://www.youtube.com/watch?v=abc".into(),
                path: "/downloads".into(),
                unique_folders: true,
                download_thumbnail: false,
                write_url_link: false,
                format: Some("audio".into()),
            })
            .await
            .unwrap();

        assert!(accepted);
        host_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_payload_shape() {
        let (api, mut host) = api();

        tokio::spawn(async move {
            let request = host.next_request().await.unwrap();
            request.respond(Ok(json!({"ffmpeg": "yes"})));
        });

        let result = api.verify_deps().await;
        assert!(matches!(result, Err(AppError::Payload(_))));
    }
}
