//! Error types for Notat.

use thiserror::Error;

use crate::platform::Platform;

/// Classifies acquisition failures by where in the download they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionKind {
    /// Metadata probe failed; nothing was downloaded.
    Info,
    /// Download ran but no usable media file was produced.
    File,
    /// Platform-side rejection (auth, region, removal).
    Platform,
}

impl std::fmt::Display for AcquisitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionKind::Info => write!(f, "info"),
            AcquisitionKind::File => write!(f, "file"),
            AcquisitionKind::Platform => write!(f, "platform"),
        }
    }
}

/// Library-level error type for Notat operations.
#[derive(Error, Debug)]
pub enum NotatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported platform for URL: {0}")]
    UnsupportedPlatform(String),

    #[error("Acquisition failed ({kind}, {platform}): {detail}")]
    Acquisition {
        platform: Platform,
        kind: AcquisitionKind,
        detail: String,
    },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Rewrite failed: {0}")]
    Rewrite(String),

    #[error("Image search failed: {0}")]
    ImageSearch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl NotatError {
    /// Shorthand for an acquisition error.
    pub fn acquisition(
        platform: Platform,
        kind: AcquisitionKind,
        detail: impl Into<String>,
    ) -> Self {
        NotatError::Acquisition {
            platform,
            kind,
            detail: detail.into(),
        }
    }
}

/// Result type alias for Notat operations.
pub type Result<T> = std::result::Result<T, NotatError>;
