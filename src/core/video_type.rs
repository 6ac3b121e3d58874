//! YouTube URL classification
//!
//! A URL is matched against an ordered pattern list and the first match wins.
//! Anything else is unrecognized. Playlists are recognized but never accepted
//! for download.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::core::models::{AppError, AppResult, VideoType};

const PATTERNS: [(&str, VideoType); 4] = [
    (r"https?://(www\.)?youtube\.com/clip/", VideoType::Clip),
    (
        r"https?://(www\.)?youtube\.com/playlist\?list=",
        VideoType::Playlist,
    ),
    (
        r"https?://(www\.)?youtube\.com/watch\?v=[^&]+&live",
        VideoType::Livestream,
    ),
    (r"https?://(www\.)?youtube\.com/watch\?v=", VideoType::Video),
];

fn compiled_patterns() -> &'static [(Regex, VideoType)] {
    static COMPILED: OnceLock<Vec<(Regex, VideoType)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|(pattern, video_type)| {
                (
                    Regex::new(pattern).expect("URL patterns are valid regexes"),
                    *video_type,
                )
            })
            .collect()
    })
}

/// Classify `url`; `None` when no pattern matches.
pub fn classify(url: &str) -> Option<VideoType> {
    compiled_patterns()
        .iter()
        .find(|(pattern, _)| pattern.is_match(url))
        .map(|(_, video_type)| *video_type)
}

/// Classify `url` and refuse what cannot be downloaded.
pub fn validate_for_download(url: &str) -> AppResult<VideoType> {
    match classify(url) {
        Some(VideoType::Playlist) => {
            debug!("Rejecting playlist URL: {}", url);
            Err(AppError::UnsupportedPlaylist)
        }
        Some(video_type) => Ok(video_type),
        None => Err(AppError::InvalidUrl(url.to_string())),
    }
}

/// Extract the `v=` id of a watch URL
pub fn video_id(url: &str) -> Option<String> {
    let start = url.find("v=")? + 2;
    let id_part = &url[start..];
    let id_end = id_part.find('&').unwrap_or(id_part.len());
    let id = &id_part[..id_end];

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_shape_is_recognized() {
        assert_eq!(
            classify("https://www.youtube.com/clip/UgkxAbc"),
            Some(VideoType::Clip)
        );
        assert_eq!(
            classify("https://youtube.com/playlist?list=PL123"),
            Some(VideoType::Playlist)
        );
        assert_eq!(
            classify("https://www.youtube.com/watch?v=abc123&live=1"),
            Some(VideoType::Livestream)
        );
        assert_eq!(
            classify("http://www.youtube.com/watch?v=abc123"),
            Some(VideoType::Video)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Also matches the plain video pattern, but livestream is checked first.
        assert_eq!(
            classify("https://www.youtube.com/watch?v=abc&live"),
            Some(VideoType::Livestream)
        );
        // Query order matters: `&live` must directly follow the id.
        assert_eq!(
            classify("https://www.youtube.com/watch?v=abc&t=10&live"),
            Some(VideoType::Video)
        );
    }

    #[test]
    fn test_unrecognized_urls() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("https://youtu.be/abc123"), None);
        assert_eq!(classify("https://vimeo.com/12345"), None);
        assert_eq!(classify("youtube.com/watch?v=abc"), None);
    }

    #[test]
    fn test_playlists_are_never_downloadable() {
        assert!(matches!(
            validate_for_download("https://www.youtube.com/playlist?list=PL1"),
            Err(AppError::UnsupportedPlaylist)
        ));
        assert!(matches!(
            validate_for_download("not a url"),
            Err(AppError::InvalidUrl(_))
        ));
        assert_eq!(
            validate_for_download("https://www.youtube.com/clip/x").unwrap(),
            VideoType::Clip
        );
    }

    #[test]
    fn test_video_id() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(video_id("https://www.youtube.com/clip/x"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?v="), None);
    }
}
