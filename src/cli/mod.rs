//! CLI module for Notat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Notat - Video Notes Generator
///
/// A CLI tool that turns video links into polished Markdown notes:
/// it downloads the audio, transcribes it, reorganizes the transcript
/// into a readable article, and optionally restyles it as a social post.
#[derive(Parser, Debug)]
#[command(name = "notat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Notat and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Generate notes from one or more video links
    Run {
        /// Video URL, text containing URLs, or path to a file of URLs
        input: String,

        /// Also generate a social-media styled version of the notes
        #[arg(long)]
        post: bool,

        /// Directory for generated Markdown files (overrides config)
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "pipeline.image_count")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
