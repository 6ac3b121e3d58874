//! URL and input validation utilities

use url::Url;

use crate::core::models::{AppError, AppResult};

/// Parse `url`, accepting only http(s)
pub fn validate_url(url: &str) -> AppResult<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| AppError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AppError::InvalidUrl(format!(
            "Unsupported scheme '{}'",
            scheme
        ))),
    }
}

/// Check if URL points at a YouTube host
pub fn is_youtube_url(url: &str) -> bool {
    validate_url(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .map(|host| host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("  http://youtube.com/clip/x ").is_ok());
        assert!(matches!(
            validate_url("ftp://youtube.com/watch?v=abc"),
            Err(AppError::InvalidUrl(_))
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_is_youtube_url() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://m.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://youtu.be/abc"));
        assert!(!is_youtube_url("https://notyoutube.com/watch?v=abc"));
        assert!(!is_youtube_url("youtube.com/watch?v=abc"));
    }
}
