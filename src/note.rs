//! Markdown artifact rendering and persistence.
//!
//! Every run produces timestamp-prefixed files in the output directory:
//! `_original.md` (raw transcript), `_organized.md` (rewritten article) and,
//! when requested, `_xiaohongshu.md` (social post with interleaved images).
//! Each artifact opens with the same video-information header block.

use std::path::PathBuf;

use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::platform::Platform;
use crate::rewrite::SocialPost;

/// Video metadata rendered into every artifact's header block.
#[derive(Debug, Clone)]
pub struct NoteMeta {
    pub title: String,
    pub uploader: String,
    pub duration_secs: u64,
    pub platform: Platform,
    pub url: String,
}

/// Writes rendered artifacts into the configured output directory.
pub struct NoteWriter {
    output_dir: PathBuf,
}

impl NoteWriter {
    pub fn new(settings: &Settings) -> Self {
        NoteWriter {
            output_dir: settings.output_dir(),
        }
    }

    pub fn write_original(
        &self,
        stamp: &str,
        meta: &NoteMeta,
        transcript: &str,
    ) -> Result<PathBuf> {
        let path = self.artifact_path(stamp, "original")?;
        std::fs::write(&path, render_original(meta, transcript))?;
        info!("Saved original transcript to {}", path.display());
        Ok(path)
    }

    pub fn write_organized(&self, stamp: &str, meta: &NoteMeta, organized: &str) -> Result<PathBuf> {
        let path = self.artifact_path(stamp, "organized")?;
        std::fs::write(&path, render_organized(meta, organized))?;
        info!("Saved organized article to {}", path.display());
        Ok(path)
    }

    pub fn write_social(
        &self,
        stamp: &str,
        meta: &NoteMeta,
        post: &SocialPost,
        images: &[String],
    ) -> Result<PathBuf> {
        let path = self.artifact_path(stamp, "xiaohongshu")?;
        std::fs::write(&path, render_social(meta, post, images))?;
        info!("Saved social post to {}", path.display());
        Ok(path)
    }

    fn artifact_path(&self, stamp: &str, kind: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(format!("{stamp}_{kind}.md")))
    }
}

/// Filename timestamp for one run's artifacts.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn header_block(meta: &NoteMeta) -> String {
    format!(
        "## 视频信息\n- 作者：{}\n- 时长：{}秒\n- 平台：{}\n- 链接：{}\n\n",
        meta.uploader, meta.duration_secs, meta.platform, meta.url
    )
}

fn render_original(meta: &NoteMeta, transcript: &str) -> String {
    format!(
        "# {}\n\n{}## 原始转录内容\n\n{}",
        meta.title,
        header_block(meta),
        transcript
    )
}

fn render_organized(meta: &NoteMeta, organized: &str) -> String {
    format!(
        "# {} - 整理版\n\n{}## 内容整理\n\n{}",
        meta.title,
        header_block(meta),
        organized
    )
}

/// Social-post layout: cover image right after the header block, second image
/// at the body's midpoint paragraph boundary, third image at the end, then
/// the space-joined tag block. Fewer images fill positions in that order.
fn render_social(meta: &NoteMeta, post: &SocialPost, images: &[String]) -> String {
    let mut doc = format!("# {}\n\n", post.cover_title());
    doc.push_str(&header_block(meta));

    if let Some(cover) = images.first() {
        doc.push_str(&format!("![封面]({})\n\n", cover));
    }

    doc.push_str("## 笔记内容\n\n");
    doc.push_str(&body_with_mid_image(&post.body, images.get(1)));

    if let Some(end) = images.get(2) {
        doc.push_str(&format!("\n\n![配图]({})", end));
    }

    if !post.tags.is_empty() {
        doc.push_str(&format!("\n\n{}", post.tags.join(" ")));
    }

    doc
}

fn body_with_mid_image(body: &str, image: Option<&String>) -> String {
    let image = match image {
        Some(image) => image,
        None => return body.to_string(),
    };
    let figure = format!("![配图]({})", image);

    let paragraphs: Vec<&str> = body.split("\n\n").collect();
    if paragraphs.len() < 2 {
        // No internal boundary to split on.
        return format!("{}\n\n{}", body, figure);
    }

    let mid = paragraphs.len() / 2;
    let mut parts: Vec<&str> = Vec::with_capacity(paragraphs.len() + 1);
    parts.extend(&paragraphs[..mid]);
    parts.push(&figure);
    parts.extend(&paragraphs[mid..]);
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> NoteMeta {
        NoteMeta {
            title: "测试视频".to_string(),
            uploader: "测试作者".to_string(),
            duration_secs: 60,
            platform: Platform::Bilibili,
            url: "https://bilibili.com/video/BV1".to_string(),
        }
    }

    #[test]
    fn test_render_original() {
        let doc = render_original(&meta(), "转录文本");
        assert_eq!(
            doc,
            "# 测试视频\n\n\
             ## 视频信息\n\
             - 作者：测试作者\n\
             - 时长：60秒\n\
             - 平台：bilibili\n\
             - 链接：https://bilibili.com/video/BV1\n\n\
             ## 原始转录内容\n\n\
             转录文本"
        );
    }

    #[test]
    fn test_render_organized_title_suffix() {
        let doc = render_organized(&meta(), "整理后的内容");
        assert!(doc.starts_with("# 测试视频 - 整理版\n\n"));
        assert!(doc.contains("## 内容整理\n\n整理后的内容"));
    }

    #[test]
    fn test_render_social_with_three_images() {
        let post = SocialPost {
            titles: vec!["✨爆款标题".to_string()],
            body: "段落一\n\n段落二".to_string(),
            tags: vec!["#标签一".to_string(), "#标签二".to_string()],
        };
        let images = vec!["c.jpg".to_string(), "m.jpg".to_string(), "e.jpg".to_string()];

        let doc = render_social(&meta(), &post, &images);
        assert_eq!(
            doc,
            "# ✨爆款标题\n\n\
             ## 视频信息\n\
             - 作者：测试作者\n\
             - 时长：60秒\n\
             - 平台：bilibili\n\
             - 链接：https://bilibili.com/video/BV1\n\n\
             ![封面](c.jpg)\n\n\
             ## 笔记内容\n\n\
             段落一\n\n\
             ![配图](m.jpg)\n\n\
             段落二\n\n\
             ![配图](e.jpg)\n\n\
             #标签一 #标签二"
        );
    }

    #[test]
    fn test_render_social_single_image_is_cover() {
        let post = SocialPost {
            titles: vec!["标题".to_string()],
            body: "正文".to_string(),
            tags: Vec::new(),
        };
        let images = vec!["c.jpg".to_string()];

        let doc = render_social(&meta(), &post, &images);
        assert!(doc.contains("![封面](c.jpg)\n\n## 笔记内容"));
        assert_eq!(doc.matches("![").count(), 1);
    }

    #[test]
    fn test_render_social_without_images_or_tags() {
        let post = SocialPost::fallback("纯文本内容");
        let doc = render_social(&meta(), &post, &[]);

        assert!(doc.starts_with("# 笔记\n\n"));
        assert!(doc.ends_with("## 笔记内容\n\n纯文本内容"));
        assert!(!doc.contains("!["));
    }

    #[test]
    fn test_mid_image_needs_paragraph_boundary() {
        let url = "m.jpg".to_string();
        assert_eq!(
            body_with_mid_image("只有一段", Some(&url)),
            "只有一段\n\n![配图](m.jpg)"
        );
        assert_eq!(
            body_with_mid_image("一\n\n二\n\n三\n\n四", Some(&url)),
            "一\n\n二\n\n![配图](m.jpg)\n\n三\n\n四"
        );
    }

    #[test]
    fn test_writer_places_files_under_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let writer = NoteWriter {
            output_dir: dir.path().to_path_buf(),
        };

        let original = writer.write_original("20260101_120000", &meta(), "文本").unwrap();
        let organized = writer.write_organized("20260101_120000", &meta(), "整理").unwrap();

        assert!(original.ends_with("20260101_120000_original.md"));
        assert!(organized.ends_with("20260101_120000_organized.md"));
        assert!(original.exists());
        assert!(organized.exists());
    }

    #[test]
    fn test_timestamp_shape() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.chars().nth(8), Some('_'));
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }
}
