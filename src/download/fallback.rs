//! Per-platform fallback acquisition strategies.
//!
//! Each platform gets exactly one alternative method, used only after the
//! primary extractor has exhausted its retries and never retried itself:
//! a dedicated downloader binary for YouTube, an HTTP scrape for Douyin's
//! mobile pages, and `you-get` for Bilibili. Fallbacks produce a video file,
//! which is normalized to MP3 before transcription.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::ytdlp::{UNKNOWN_TITLE, UNKNOWN_UPLOADER};
use super::{Acquisition, AcquireStrategy};
use crate::error::{AcquisitionKind, NotatError, Result};
use crate::platform::VideoReference;

/// Mobile browser identity for page scraping; short-video sites serve the
/// playable page variant to phones.
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1";

/// Dedicated single-purpose downloader for YouTube.
pub struct YoutubeDlStrategy;

impl YoutubeDlStrategy {
    pub fn new() -> Self {
        YoutubeDlStrategy
    }
}

impl Default for YoutubeDlStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AcquireStrategy for YoutubeDlStrategy {
    fn name(&self) -> &str {
        "youtube-dl"
    }

    #[instrument(skip(self, work_dir))]
    async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
        std::fs::create_dir_all(work_dir)?;
        let template = work_dir.join("%(title)s.%(ext)s");

        let result = Command::new("youtube-dl")
            .arg("--format").arg("best")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg(&vref.url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotatError::ToolNotFound("youtube-dl".into()));
            }
            Err(e) => {
                return Err(NotatError::acquisition(
                    vref.platform,
                    AcquisitionKind::Platform,
                    format!("youtube-dl execution failed: {e}"),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Platform,
                format!("youtube-dl failed: {stderr}"),
            ));
        }

        let video = find_media_file(work_dir, &["mp4", "webm", "mkv", "flv"]).ok_or_else(|| {
            NotatError::acquisition(
                vref.platform,
                AcquisitionKind::File,
                "No media file produced by youtube-dl",
            )
        })?;

        finish_media(video, vref, work_dir).await
    }
}

/// HTTP-scrape strategy for short-video pages.
///
/// Fetches the page with a mobile identity, looks for a `<video>` element's
/// source, and failing that regex-scans the raw body against known embedded
/// URL shapes.
pub struct ScrapeStrategy {
    http: reqwest::Client,
}

impl ScrapeStrategy {
    pub fn new(http: reqwest::Client) -> Self {
        ScrapeStrategy { http }
    }
}

#[async_trait]
impl AcquireStrategy for ScrapeStrategy {
    fn name(&self) -> &str {
        "page-scrape"
    }

    #[instrument(skip(self, work_dir))]
    async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
        std::fs::create_dir_all(work_dir)?;

        let response = self
            .http
            .get(&vref.url)
            .header("User-Agent", MOBILE_USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Platform,
                format!("Cannot access page: HTTP {}", response.status()),
            ));
        }

        let body = response.text().await?;
        let video_url = extract_video_url(&body).ok_or_else(|| {
            NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Info,
                "No video URL found in page",
            )
        })?;

        info!("Scraped video URL, streaming download");
        debug!("Video URL: {}", video_url);

        let video_response = self
            .http
            .get(&video_url)
            .header("User-Agent", MOBILE_USER_AGENT)
            .send()
            .await?;

        if !video_response.status().is_success() {
            return Err(NotatError::acquisition(
                vref.platform,
                AcquisitionKind::File,
                format!("Cannot download video: HTTP {}", video_response.status()),
            ));
        }

        let video_path = work_dir.join("video.mp4");
        let mut file = tokio::fs::File::create(&video_path).await?;
        let mut stream = video_response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        finish_media(video_path, vref, work_dir).await
    }
}

/// `you-get` subprocess strategy for regional video hosts.
pub struct YouGetStrategy;

impl YouGetStrategy {
    pub fn new() -> Self {
        YouGetStrategy
    }
}

impl Default for YouGetStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AcquireStrategy for YouGetStrategy {
    fn name(&self) -> &str {
        "you-get"
    }

    #[instrument(skip(self, work_dir))]
    async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
        std::fs::create_dir_all(work_dir)?;

        let result = Command::new("you-get")
            .arg("--no-proxy")
            .arg("--no-check-certificate")
            .arg("-o").arg(work_dir)
            .arg(&vref.url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotatError::ToolNotFound("you-get".into()));
            }
            Err(e) => {
                return Err(NotatError::acquisition(
                    vref.platform,
                    AcquisitionKind::Platform,
                    format!("you-get execution failed: {e}"),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotatError::acquisition(
                vref.platform,
                AcquisitionKind::Platform,
                format!("you-get failed: {stderr}"),
            ));
        }

        let video = find_media_file(work_dir, &["mp4", "flv", "webm"]).ok_or_else(|| {
            NotatError::acquisition(
                vref.platform,
                AcquisitionKind::File,
                "No media file produced by you-get",
            )
        })?;

        finish_media(video, vref, work_dir).await
    }
}

/// Pull a playable video URL out of page HTML.
///
/// DOM first: the `src` or `data-src` of any `<video>` element. Otherwise an
/// ordered list of raw-body patterns, first match wins. Protocol-relative
/// results are normalized to HTTPS.
fn extract_video_url(body: &str) -> Option<String> {
    let document = scraper::Html::parse_document(body);
    let selector = scraper::Selector::parse("video").expect("Invalid selector");

    let mut video_url = document.select(&selector).find_map(|video| {
        video
            .value()
            .attr("src")
            .or_else(|| video.value().attr("data-src"))
            .map(String::from)
    });

    if video_url.is_none() {
        let patterns = [
            r#"https?://[^"'\s]+\.(?:mp4|m3u8)[^"'\s]*"#,
            r#"playAddr":"([^"]+)""#,
            r#"play_url":"([^"]+)""#,
        ];
        for pattern in patterns {
            let re = Regex::new(pattern).expect("Invalid regex");
            if let Some(caps) = re.captures(body) {
                let m = caps.get(1).or_else(|| caps.get(0));
                video_url = m.map(|m| m.as_str().to_string());
                break;
            }
        }
    }

    video_url.map(|url| {
        if !url.starts_with("http") && url.starts_with("//") {
            format!("https:{}", url)
        } else {
            url
        }
    })
}

/// First file in `dir` with one of the given extensions, in sorted order.
fn find_media_file(dir: &Path, extensions: &[&str]) -> Option<PathBuf> {
    let mut candidates: Vec<_> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Normalize a fallback's video file to MP3 and wrap it as an acquisition.
/// Fallback methods carry no metadata, so the placeholders stand in.
async fn finish_media(
    video: PathBuf,
    vref: &VideoReference,
    work_dir: &Path,
) -> Result<Acquisition> {
    let audio_path = work_dir.join("audio.mp3");
    normalize_to_mp3(&video, &audio_path).await?;
    if let Err(e) = std::fs::remove_file(&video) {
        warn!("Could not remove intermediate video file: {}", e);
    }

    Ok(Acquisition {
        audio_path,
        title: UNKNOWN_TITLE.to_string(),
        uploader: UNKNOWN_UPLOADER.to_string(),
        duration_secs: 0,
        platform: vref.platform,
    })
}

/// Converts a media file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(NotatError::ToolFailed(format!(
                "ffmpeg conversion failed: {err}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(NotatError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(NotatError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_video_tag() {
        let html = r#"<html><body><video src="https://cdn.example/v.mp4"></video></body></html>"#;
        assert_eq!(
            extract_video_url(html),
            Some("https://cdn.example/v.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_from_data_src() {
        let html = r#"<video data-src="//cdn.example/lazy.mp4"></video>"#;
        // Protocol-relative URLs are normalized to HTTPS.
        assert_eq!(
            extract_video_url(html),
            Some("https://cdn.example/lazy.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_from_raw_body_patterns() {
        let html = r#"<script>var cfg = {"playAddr":"https://v.example/stream.m3u8"};</script>"#;
        assert_eq!(
            extract_video_url(html),
            Some("https://v.example/stream.m3u8".to_string())
        );

        let html = r#"<script>{"play_url":"//v.example/play"}</script>"#;
        assert_eq!(
            extract_video_url(html),
            Some("https://v.example/play".to_string())
        );
    }

    #[test]
    fn test_extract_pattern_order() {
        // A bare media URL anywhere in the body outranks the keyed patterns.
        let html = r#"see https://a.example/first.mp4 and {"playAddr":"https://b.example/x"}"#;
        assert_eq!(
            extract_video_url(html),
            Some("https://a.example/first.mp4".to_string())
        );
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(extract_video_url("<html><body>no video here</body></html>"), None);
    }

    #[test]
    fn test_find_media_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.flv"), b"x").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();

        assert_eq!(
            find_media_file(dir.path(), &["mp4", "flv", "webm"]),
            Some(dir.path().join("b.flv"))
        );
        assert_eq!(find_media_file(dir.path(), &["mp4"]), None);
    }
}
