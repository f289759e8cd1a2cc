//! Audio acquisition from video platforms.
//!
//! The engine drives a primary extractor (yt-dlp) with a bounded retry loop,
//! then hands off to a single per-platform fallback strategy. Failures are
//! classified into operator-facing messages so the pipeline can report what
//! went wrong in plain terms.

mod cookies;
mod fallback;
mod ytdlp;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

pub use cookies::CookieStore;
pub use fallback::{ScrapeStrategy, YouGetStrategy, YoutubeDlStrategy};
pub use ytdlp::YtDlpStrategy;

use crate::config::Settings;
use crate::error::{NotatError, Result};
use crate::openai::create_http_client;
use crate::platform::{Platform, VideoReference};

/// How many times the primary strategy runs before the fallback is consulted.
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between primary attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// A downloaded, transcription-ready audio file plus whatever metadata the
/// acquiring strategy could recover.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub audio_path: PathBuf,
    pub title: String,
    pub uploader: String,
    pub duration_secs: u64,
    pub platform: Platform,
}

/// One way of turning a video reference into a local audio file.
#[async_trait]
pub trait AcquireStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition>;
}

/// Retry-and-fallback driver over acquisition strategies.
pub struct AcquisitionEngine {
    primary: Arc<dyn AcquireStrategy>,
    fallbacks: HashMap<Platform, Arc<dyn AcquireStrategy>>,
}

impl AcquisitionEngine {
    /// Engine with the standard strategy wiring: yt-dlp as primary, and a
    /// platform-specific alternative each for YouTube, Douyin and Bilibili.
    pub fn new(settings: &Settings) -> Self {
        let cookies = CookieStore::new(settings.cookie_dir());

        let mut fallbacks: HashMap<Platform, Arc<dyn AcquireStrategy>> = HashMap::new();
        fallbacks.insert(Platform::Youtube, Arc::new(YoutubeDlStrategy::new()));
        fallbacks.insert(
            Platform::Douyin,
            Arc::new(ScrapeStrategy::new(create_http_client())),
        );
        fallbacks.insert(Platform::Bilibili, Arc::new(YouGetStrategy::new()));

        AcquisitionEngine {
            primary: Arc::new(YtDlpStrategy::new(cookies)),
            fallbacks,
        }
    }

    /// Engine over caller-supplied strategies.
    pub(crate) fn with_strategies(
        primary: Arc<dyn AcquireStrategy>,
        fallbacks: HashMap<Platform, Arc<dyn AcquireStrategy>>,
    ) -> Self {
        AcquisitionEngine { primary, fallbacks }
    }

    /// Acquire audio for a video.
    ///
    /// Runs the primary strategy up to [`MAX_ATTEMPTS`] times with a fixed
    /// [`RETRY_DELAY`] pause between attempts. If every attempt fails, the
    /// platform's fallback strategy (when one exists) runs exactly once. When
    /// the fallback also fails, the primary's last error is returned; the
    /// fallback error is only logged.
    #[instrument(skip(self, work_dir), fields(url = %vref.url, platform = %vref.platform))]
    pub async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
        if !vref.platform.is_supported() {
            return Err(NotatError::UnsupportedPlatform(vref.url.clone()));
        }

        let mut attempt = 0;
        let primary_err = loop {
            attempt += 1;
            info!(
                "Download attempt {}/{} via {}",
                attempt,
                MAX_ATTEMPTS,
                self.primary.name()
            );
            match self.primary.acquire(vref, work_dir).await {
                Ok(acquisition) => return Ok(acquisition),
                Err(e) => {
                    warn!("{} attempt {} failed: {}", self.primary.name(), attempt, e);
                    if attempt >= MAX_ATTEMPTS {
                        break e;
                    }
                    sleep(RETRY_DELAY).await;
                }
            }
        };

        if let Some(fallback) = self.fallbacks.get(&vref.platform) {
            info!("Trying fallback method: {}", fallback.name());
            match fallback.acquire(vref, work_dir).await {
                Ok(acquisition) => return Ok(acquisition),
                Err(e) => warn!("Fallback {} failed: {}", fallback.name(), e),
            }
        }

        Err(primary_err)
    }
}

/// Map a raw failure detail onto an operator-facing message.
///
/// Checks run in a fixed order; the first matching symptom wins.
pub fn classify(detail: &str, platform: Platform) -> String {
    let lower = detail.to_lowercase();
    if detail.contains("SSL") {
        "SSL证书验证失败，请检查网络连接".to_string()
    } else if lower.contains("cookies") {
        format!("{platform}访问被拒绝，可能需要更新cookie或更换IP地址")
    } else if detail.contains("404") {
        "视频不存在或已被删除".to_string()
    } else if detail.contains("403") {
        "访问被拒绝，可能需要登录或更换IP地址".to_string()
    } else if lower.contains("unavailable") {
        "视频当前不可用，可能是地区限制或版权问题".to_string()
    } else {
        format!("下载失败: {detail}")
    }
}

/// Classify an acquisition error, preferring the strategy's raw detail over
/// the formatted error display.
pub fn classify_error(err: &NotatError, platform: Platform) -> String {
    match err {
        NotatError::Acquisition { detail, .. } => classify(detail, platform),
        other => classify(&other.to_string(), platform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AcquisitionKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Strategy that fails until (optionally) succeeding on a given call
    /// number, recording when each call happened.
    struct ScriptedStrategy {
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
        succeed_on: Option<usize>,
    }

    impl ScriptedStrategy {
        fn new(succeed_on: Option<usize>) -> Arc<Self> {
            Arc::new(ScriptedStrategy {
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
                succeed_on,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AcquireStrategy for ScriptedStrategy {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn acquire(&self, vref: &VideoReference, _work_dir: &Path) -> Result<Acquisition> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.call_times.lock().unwrap().push(Instant::now());
            if self.succeed_on == Some(n) {
                Ok(Acquisition {
                    audio_path: PathBuf::from("audio.mp3"),
                    title: "t".into(),
                    uploader: "u".into(),
                    duration_secs: 1,
                    platform: vref.platform,
                })
            } else {
                Err(NotatError::acquisition(
                    vref.platform,
                    AcquisitionKind::Platform,
                    format!("scripted failure {n}"),
                ))
            }
        }
    }

    fn engine_with_fallback(
        primary: Arc<ScriptedStrategy>,
        fallback: Arc<ScriptedStrategy>,
        platform: Platform,
    ) -> AcquisitionEngine {
        let mut fallbacks: HashMap<Platform, Arc<dyn AcquireStrategy>> = HashMap::new();
        fallbacks.insert(platform, fallback);
        AcquisitionEngine::with_strategies(primary, fallbacks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_attempts_then_fallback() {
        let primary = ScriptedStrategy::new(None);
        let fallback = ScriptedStrategy::new(Some(1));
        let engine = engine_with_fallback(primary.clone(), fallback.clone(), Platform::Youtube);

        let vref = VideoReference::new("https://youtube.com/watch?v=x");
        let result = engine.acquire(&vref, Path::new("/tmp/unused")).await;

        assert!(result.is_ok());
        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 1);

        // Consecutive primary attempts are spaced by the fixed delay.
        let times = primary.call_times.lock().unwrap();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= RETRY_DELAY);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_skips_retries_and_fallback() {
        let primary = ScriptedStrategy::new(Some(1));
        let fallback = ScriptedStrategy::new(Some(1));
        let engine = engine_with_fallback(primary.clone(), fallback.clone(), Platform::Youtube);

        let vref = VideoReference::new("https://youtu.be/x");
        let result = engine.acquire(&vref, Path::new("/tmp/unused")).await;

        assert!(result.is_ok());
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attempt_can_succeed() {
        let primary = ScriptedStrategy::new(Some(2));
        let fallback = ScriptedStrategy::new(Some(1));
        let engine = engine_with_fallback(primary.clone(), fallback.clone(), Platform::Youtube);

        let vref = VideoReference::new("https://youtube.com/watch?v=x");
        let result = engine.acquire(&vref, Path::new("/tmp/unused")).await;

        assert!(result.is_ok());
        assert_eq!(primary.calls(), 2);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fallback_for_platform_propagates_error() {
        let primary = ScriptedStrategy::new(None);
        let engine = AcquisitionEngine::with_strategies(primary.clone(), HashMap::new());

        let vref = VideoReference::new("https://youtube.com/watch?v=x");
        let err = engine
            .acquire(&vref, Path::new("/tmp/unused"))
            .await
            .unwrap_err();

        assert_eq!(primary.calls(), 3);
        match err {
            NotatError::Acquisition { detail, .. } => {
                assert_eq!(detail, "scripted failure 3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_platform_rejected_without_attempts() {
        let primary = ScriptedStrategy::new(Some(1));
        let engine = AcquisitionEngine::with_strategies(primary.clone(), HashMap::new());

        let vref = VideoReference::new("https://example.com/video/1");
        let err = engine
            .acquire(&vref, Path::new("/tmp/unused"))
            .await
            .unwrap_err();

        assert_eq!(primary.calls(), 0);
        assert!(matches!(err, NotatError::UnsupportedPlatform(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fallback_returns_primary_error() {
        let primary = ScriptedStrategy::new(None);
        let fallback = ScriptedStrategy::new(None);
        let engine = engine_with_fallback(primary.clone(), fallback.clone(), Platform::Douyin);

        let vref = VideoReference::new("https://douyin.com/video/1");
        let err = engine
            .acquire(&vref, Path::new("/tmp/unused"))
            .await
            .unwrap_err();

        assert_eq!(fallback.calls(), 1);
        // The primary's last error wins over the fallback's.
        match err {
            NotatError::Acquisition { detail, .. } => {
                assert_eq!(detail, "scripted failure 3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_messages() {
        let p = Platform::Douyin;
        assert_eq!(classify("SSL: CERTIFICATE_VERIFY_FAILED", p), "SSL证书验证失败，请检查网络连接");
        assert_eq!(
            classify("Use --cookies to authenticate", p),
            "douyin访问被拒绝，可能需要更新cookie或更换IP地址"
        );
        assert_eq!(classify("HTTP Error 404: Not Found", p), "视频不存在或已被删除");
        assert_eq!(classify("HTTP Error 403: Forbidden", p), "访问被拒绝，可能需要登录或更换IP地址");
        assert_eq!(
            classify("This video is unavailable", p),
            "视频当前不可用，可能是地区限制或版权问题"
        );
        assert_eq!(classify("network reset", p), "下载失败: network reset");
    }

    #[test]
    fn test_classify_order_ssl_wins() {
        // "SSL" outranks the cookie hint when both appear.
        assert_eq!(
            classify("SSL handshake failed, try cookies", Platform::Youtube),
            "SSL证书验证失败，请检查网络连接"
        );
    }

    #[test]
    fn test_classify_error_uses_raw_detail() {
        let err = NotatError::acquisition(
            Platform::Bilibili,
            AcquisitionKind::Platform,
            "HTTP Error 404: Not Found",
        );
        assert_eq!(classify_error(&err, Platform::Bilibili), "视频不存在或已被删除");

        let err = NotatError::ToolNotFound("yt-dlp".into());
        assert!(classify_error(&err, Platform::Bilibili).starts_with("下载失败: "));
    }
}
