//! Notat - Video Notes Generator
//!
//! A CLI tool that turns video links into polished Markdown notes.
//!
//! The name "Notat" comes from the Norwegian/Scandinavian word for "note."
//!
//! # Overview
//!
//! Notat allows you to:
//! - Download audio from YouTube, Douyin and Bilibili links
//! - Transcribe the audio to text
//! - Reorganize the transcript into a structured, readable article
//! - Restyle the article as a social-media post with images and tags
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `platform` - Video platform classification
//! - `links` - URL extraction from CLI input
//! - `download` - Audio acquisition with retry and per-platform fallbacks
//! - `transcribe` - Speech-to-text transcription
//! - `segment` - Transcript chunking for the rewrite stage
//! - `rewrite` - Article reorganization and the social-post transform
//! - `images` - Cover and body image search
//! - `note` - Markdown artifact rendering and writing
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use notat::config::Settings;
//! use notat::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     // Turn one video link into Markdown notes
//!     let files = pipeline
//!         .process_video("https://www.bilibili.com/video/BV1xx411c7mD", false)
//!         .await?;
//!     println!("Wrote {} files", files.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod images;
pub mod links;
pub mod note;
pub mod openai;
pub mod pipeline;
pub mod platform;
pub mod rewrite;
pub mod segment;
pub mod transcribe;

pub use error::{NotatError, Result};
