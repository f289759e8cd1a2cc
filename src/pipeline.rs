//! End-to-end pipeline: URL in, Markdown artifacts out.
//!
//! Stages run sequentially per URL and degrade rather than abort: an
//! unsupported platform, a failed acquisition, or an empty transcription end
//! the run early with an empty artifact list, and every later stage falls
//! back to the best text it has.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{Prompts, Settings};
use crate::download::{classify_error, AcquisitionEngine};
use crate::error::Result;
use crate::images::ImageSearcher;
use crate::note::{self, NoteMeta, NoteWriter};
use crate::platform::VideoReference;
use crate::rewrite::{Rewriter, StyleTransformer};
use crate::transcribe::{Transcriber, WhisperTranscriber};

/// The wired-up processing pipeline.
pub struct Pipeline {
    settings: Settings,
    engine: AcquisitionEngine,
    transcriber: Arc<dyn Transcriber>,
    rewriter: Rewriter,
    style: StyleTransformer,
    images: ImageSearcher,
    writer: NoteWriter,
}

impl Pipeline {
    /// Create a pipeline with the standard components.
    pub fn new(settings: Settings) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(&settings));
        let engine = AcquisitionEngine::new(&settings);
        Self::assemble(settings, engine, transcriber)
    }

    /// Create a pipeline with custom acquisition and transcription components.
    pub fn with_components(
        settings: Settings,
        engine: AcquisitionEngine,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        Self::assemble(settings, engine, transcriber)
    }

    fn assemble(
        settings: Settings,
        engine: AcquisitionEngine,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let rewriter = Rewriter::new(&settings).with_prompts(prompts.clone());
        let style = StyleTransformer::new(&settings).with_prompts(prompts.clone());
        let images = ImageSearcher::new(&settings).with_prompts(prompts);
        let writer = NoteWriter::new(&settings);

        Ok(Pipeline {
            settings,
            engine,
            transcriber,
            rewriter,
            style,
            images,
            writer,
        })
    }

    /// Process one video URL into Markdown artifacts.
    ///
    /// Returns the written artifact paths in write order; an empty list means
    /// the run degraded before the first artifact. `social` additionally
    /// produces the social-post artifact.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn process_video(&self, url: &str, social: bool) -> Result<Vec<PathBuf>> {
        let vref = VideoReference::new(url);
        if !vref.platform.is_supported() {
            warn!("Unsupported platform for URL: {}", url);
            eprintln!("  Unsupported platform, skipping: {}", url);
            return Ok(Vec::new());
        }

        let output_dir = self.settings.output_dir();
        std::fs::create_dir_all(&output_dir)?;
        // Scoped work dir for the downloaded media, removed on every exit path.
        let work_dir = tempfile::tempdir_in(&output_dir)?;

        eprintln!("  Downloading audio...");
        let acquisition = match self.engine.acquire(&vref, work_dir.path()).await {
            Ok(acquisition) => acquisition,
            Err(e) => {
                let message = classify_error(&e, vref.platform);
                warn!("Acquisition failed: {}", message);
                eprintln!("  {}", message);
                return Ok(Vec::new());
            }
        };
        eprintln!("  Title: {}", acquisition.title);

        eprintln!("  Transcribing...");
        let transcript = match self.transcriber.transcribe(&acquisition.audio_path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Transcription failed: {}", e);
                eprintln!("  Transcription failed, nothing to process.");
                return Ok(Vec::new());
            }
        };
        if transcript.trim().is_empty() {
            warn!("Transcription produced no text, skipping remaining stages");
            eprintln!("  Transcription empty, nothing to process.");
            return Ok(Vec::new());
        }
        eprintln!(
            "  Transcription complete ({} characters)",
            transcript.chars().count()
        );

        let meta = NoteMeta {
            title: acquisition.title.clone(),
            uploader: acquisition.uploader.clone(),
            duration_secs: acquisition.duration_secs,
            platform: acquisition.platform,
            url: url.to_string(),
        };
        let stamp = note::timestamp();
        let mut written = Vec::new();

        written.push(self.writer.write_original(&stamp, &meta, &transcript)?);

        eprintln!("  Organizing article...");
        let organized = self.rewriter.organize(&transcript).await;
        written.push(self.writer.write_organized(&stamp, &meta, &organized)?);

        if social {
            eprintln!("  Styling social post...");
            let post = self.style.transform(&organized).await;

            let image_urls = match self
                .images
                .search(post.cover_title(), self.settings.pipeline.image_count)
                .await
            {
                Ok(urls) => urls,
                Err(e) => {
                    warn!("Image search failed: {}", e);
                    Vec::new()
                }
            };

            written.push(self.writer.write_social(&stamp, &meta, &post, &image_urls)?);
        }

        info!("Wrote {} artifact(s)", written.len());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{AcquireStrategy, Acquisition};
    use crate::error::{AcquisitionKind, NotatError};
    use crate::platform::Platform;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStrategy {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl CountingStrategy {
        fn new(succeed: bool) -> Arc<Self> {
            Arc::new(CountingStrategy {
                calls: AtomicUsize::new(0),
                succeed,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AcquireStrategy for CountingStrategy {
        fn name(&self) -> &str {
            "counting"
        }

        async fn acquire(&self, vref: &VideoReference, work_dir: &Path) -> Result<Acquisition> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(Acquisition {
                    audio_path: work_dir.join("audio.mp3"),
                    title: "测试视频".to_string(),
                    uploader: "测试作者".to_string(),
                    duration_secs: 42,
                    platform: vref.platform,
                })
            } else {
                Err(NotatError::acquisition(
                    vref.platform,
                    AcquisitionKind::Platform,
                    "download refused",
                ))
            }
        }
    }

    struct FixedTranscriber {
        text: String,
        calls: AtomicUsize,
    }

    impl FixedTranscriber {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(FixedTranscriber {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn test_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.output.directory = dir.join("notes").display().to_string();
        settings
    }

    fn test_pipeline(
        settings: Settings,
        strategy: Arc<CountingStrategy>,
        transcriber: Arc<FixedTranscriber>,
    ) -> Pipeline {
        let engine = AcquisitionEngine::with_strategies(strategy, HashMap::new());
        Pipeline::with_components(settings, engine, transcriber).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_platform_skips_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = CountingStrategy::new(true);
        let transcriber = FixedTranscriber::new("some text");
        let pipeline = test_pipeline(test_settings(dir.path()), strategy.clone(), transcriber);

        let written = pipeline
            .process_video("https://example.com/x", false)
            .await
            .unwrap();

        assert!(written.is_empty());
        assert_eq!(strategy.calls(), 0);
        // Rejected before any I/O: the output directory was never created.
        assert!(!dir.path().join("notes").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_acquisition_skips_url() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = CountingStrategy::new(false);
        let transcriber = FixedTranscriber::new("some text");
        let pipeline =
            test_pipeline(test_settings(dir.path()), strategy.clone(), transcriber.clone());

        let written = pipeline
            .process_video("https://youtube.com/watch?v=x", false)
            .await
            .unwrap();

        assert!(written.is_empty());
        assert_eq!(strategy.calls(), 3);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_transcription_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = CountingStrategy::new(true);
        let transcriber = FixedTranscriber::new("   ");
        let pipeline =
            test_pipeline(test_settings(dir.path()), strategy.clone(), transcriber.clone());

        let written = pipeline
            .process_video("https://www.bilibili.com/video/BV1", true)
            .await
            .unwrap();

        assert!(written.is_empty());
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

        // The work dir is gone and no artifact remains.
        let notes = dir.path().join("notes");
        let leftover: Vec<_> = std::fs::read_dir(&notes).unwrap().collect();
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn test_offline_run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = CountingStrategy::new(true);
        let transcriber = FixedTranscriber::new("第一句话。\n\n第二句话。");
        let pipeline = test_pipeline(test_settings(dir.path()), strategy, transcriber);

        let written = pipeline
            .process_video("https://www.douyin.com/video/1", true)
            .await
            .unwrap();

        assert_eq!(written.len(), 3);
        assert!(written[0].to_string_lossy().ends_with("_original.md"));
        assert!(written[1].to_string_lossy().ends_with("_organized.md"));
        assert!(written[2].to_string_lossy().ends_with("_xiaohongshu.md"));

        let original = std::fs::read_to_string(&written[0]).unwrap();
        assert!(original.contains("# 测试视频"));
        assert!(original.contains("- 平台：douyin"));
        assert!(original.contains("## 原始转录内容\n\n第一句话。"));

        // Without a rewrite endpoint the organized artifact carries the
        // transcript unchanged.
        let organized = std::fs::read_to_string(&written[1]).unwrap();
        assert!(organized.contains("# 测试视频 - 整理版"));
        assert!(organized.contains("## 内容整理\n\n第一句话。"));

        // Without endpoints the social post degrades to the fallback title.
        let social = std::fs::read_to_string(&written[2]).unwrap();
        assert!(social.starts_with("# 笔记\n\n"));
        assert!(social.contains("## 笔记内容"));
    }

    #[tokio::test]
    async fn test_default_run_omits_social_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = CountingStrategy::new(true);
        let transcriber = FixedTranscriber::new("内容。");
        let pipeline = test_pipeline(test_settings(dir.path()), strategy, transcriber);

        let written = pipeline
            .process_video("https://youtu.be/x", false)
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(!written
            .iter()
            .any(|p| p.to_string_lossy().contains("xiaohongshu")));
    }
}
