//! Video platform classification.
//!
//! A URL is classified once, before any network or disk I/O, by pure
//! substring matching against known platform domains. Everything the rest of
//! the pipeline does is keyed off that classification.

use serde::{Deserialize, Serialize};

/// A supported video platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Douyin,
    Bilibili,
    Unknown,
}

impl Platform {
    /// Classify a URL into a platform. No side effects, no network.
    ///
    /// `Unknown` is terminal: the pipeline rejects the URL before attempting
    /// any download.
    pub fn resolve(url: &str) -> Platform {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Platform::Youtube
        } else if url.contains("douyin.com") {
            Platform::Douyin
        } else if url.contains("bilibili.com") {
            Platform::Bilibili
        } else {
            Platform::Unknown
        }
    }

    /// Whether this platform can be acquired at all.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unknown)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Youtube => write!(f, "youtube"),
            Platform::Douyin => write!(f, "douyin"),
            Platform::Bilibili => write!(f, "bilibili"),
            Platform::Unknown => write!(f, "unknown"),
        }
    }
}

/// An input URL paired with its resolved platform.
#[derive(Debug, Clone)]
pub struct VideoReference {
    pub url: String,
    pub platform: Platform,
}

impl VideoReference {
    /// Resolve a URL into a reference. Always succeeds; check
    /// [`Platform::is_supported`] before acquisition.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let platform = Platform::resolve(&url);
        VideoReference { url, platform }
    }
}
