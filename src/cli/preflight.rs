//! Pre-flight checks before expensive operations.
//!
//! Validates that required external tools are available before starting a
//! run that would otherwise fail midway through a download.

use crate::error::{NotatError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Note generation requires the download and audio tools.
    Run,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
/// Missing API keys are not checked here: they degrade individual pipeline
/// stages rather than blocking the whole run.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Run => {
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(NotatError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(NotatError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(NotatError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
