//! Primary acquisition strategy: yt-dlp.
//!
//! One invocation per attempt downloads best-available audio, extracts it to
//! MP3 via yt-dlp's ffmpeg post-processor, and prints the video's metadata
//! as JSON on stdout.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{Acquisition, AcquireStrategy, CookieStore};
use crate::error::{AcquisitionKind, NotatError, Result};
use crate::platform::VideoReference;

/// Fallback title when the extractor reports none.
pub const UNKNOWN_TITLE: &str = "未知标题";
/// Fallback uploader when the extractor reports none.
pub const UNKNOWN_UPLOADER: &str = "未知作者";

/// General-purpose extractor wrapping the `yt-dlp` binary.
pub struct YtDlpStrategy {
    cookies: CookieStore,
}

impl YtDlpStrategy {
    pub fn new(cookies: CookieStore) -> Self {
        YtDlpStrategy { cookies }
    }
}

#[async_trait]
impl AcquireStrategy for YtDlpStrategy {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self, work_dir), fields(platform = %vref.platform))]
    async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
        std::fs::create_dir_all(work_dir)?;

        let template = work_dir.join("%(title)s.%(ext)s");

        let mut cmd = Command::new("yt-dlp");
        cmd.arg("--format").arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--audio-quality").arg("0")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--print-json")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings");

        if let Some(cookie_file) = self.cookies.valid_cookie(vref.platform) {
            debug!("Attaching cookie file {:?}", cookie_file);
            cmd.arg("--cookies").arg(cookie_file);
        }

        let result = cmd
            .arg(&vref.url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotatError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(NotatError::acquisition(
                    vref.platform,
                    AcquisitionKind::Platform,
                    format!("yt-dlp execution failed: {e}"),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Platform,
                format!("yt-dlp failed: {stderr}"),
            ));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let info: serde_json::Value = serde_json::from_str(json_str.trim()).map_err(|e| {
            NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Info,
                format!("Cannot parse extractor metadata: {e}"),
            )
        })?;

        let audio_path = find_mp3(work_dir).ok_or_else(|| {
            NotatError::acquisition(
                vref.platform,
                AcquisitionKind::File,
                "No audio file produced by extractor",
            )
        })?;

        Ok(Acquisition {
            audio_path,
            title: info["title"].as_str().unwrap_or(UNKNOWN_TITLE).to_string(),
            uploader: info["uploader"]
                .as_str()
                .unwrap_or(UNKNOWN_UPLOADER)
                .to_string(),
            duration_secs: info["duration"].as_f64().unwrap_or(0.0) as u64,
            platform: vref.platform,
        })
    }
}

/// Locate the extracted MP3 in the work directory. Sorted so repeated scans
/// are deterministic.
pub(crate) fn find_mp3(dir: &Path) -> Option<std::path::PathBuf> {
    let mut candidates: Vec<_> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "mp3"))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_mp3_picks_audio_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"video").unwrap();
        assert!(find_mp3(dir.path()).is_none());

        std::fs::write(dir.path().join("clip.mp3"), b"audio").unwrap();
        assert_eq!(find_mp3(dir.path()), Some(dir.path().join("clip.mp3")));
    }
}
