//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Simple check result for init command.
struct CheckIssue {
    name: String,
    hint: String,
}

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Notat Setup");
    println!();
    println!("Welcome to Notat! Let's make sure everything is configured correctly.\n");

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let tool_issues = check_prerequisites();

    if !tool_issues.is_empty() {
        Output::warning("Some tools are missing. Please install them:");
        println!();
        for issue in &tool_issues {
            println!("  {} {} - not found", style("✗").red(), style(&issue.name).bold());
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the missing tools and run 'notat init' again.");
            return Ok(());
        }
    } else {
        Output::success("All required tools are installed!");
    }

    println!();

    // Step 2: Check API keys
    println!("{}", style("Step 2: Checking API configuration").bold().cyan());
    println!();

    let missing_keys = check_api_keys(settings);

    if !missing_keys.is_empty() {
        Output::warning("Some API keys are not configured:");
        println!();
        for issue in &missing_keys {
            println!("  {} {}", style("✗").red(), style(&issue.name).bold());
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
        println!();
        println!("  Set them in your shell configuration (~/.bashrc, ~/.zshrc, etc.),");
        println!("  for example: {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without them?")? {
            println!();
            Output::info("Setup cancelled. Set your API keys and run 'notat init' again.");
            return Ok(());
        }
    } else {
        Output::success("All API keys are configured!");
    }

    println!();

    // Step 3: Create directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let output_dir = settings.output_dir();
    let cookie_dir = settings.cookie_dir();

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir)?;
        Output::success(&format!("Created output directory: {}", output_dir.display()));
    } else {
        Output::info(&format!("Output directory exists: {}", output_dir.display()));
    }

    if !cookie_dir.exists() {
        std::fs::create_dir_all(&cookie_dir)?;
        Output::success(&format!("Created cookie directory: {}", cookie_dir.display()));
    } else {
        Output::info(&format!("Cookie directory exists: {}", cookie_dir.display()));
    }

    println!();

    // Step 4: Create config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("notat config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("notat doctor").cyan());
    println!("  {} Generate notes from a video", style("notat run <url>").cyan());
    println!(
        "  {} Also produce a social-media version",
        style("notat run <url> --post").cyan()
    );
    println!();
    println!("For more help: {}", style("notat --help").cyan());

    Ok(())
}

/// Check prerequisites and return any issues.
fn check_prerequisites() -> Vec<CheckIssue> {
    use std::process::Command;

    let mut issues = Vec::new();

    // Check yt-dlp
    if Command::new("yt-dlp").arg("--version").output().is_err() {
        issues.push(CheckIssue {
            name: "yt-dlp".to_string(),
            hint: install_hint("yt-dlp").to_string(),
        });
    }

    // Check ffmpeg
    if Command::new("ffmpeg").arg("-version").output().is_err() {
        issues.push(CheckIssue {
            name: "ffmpeg".to_string(),
            hint: install_hint("ffmpeg").to_string(),
        });
    }

    issues
}

/// Check API keys and return any that are missing.
fn check_api_keys(settings: &Settings) -> Vec<CheckIssue> {
    let mut issues = Vec::new();

    if settings.api.openai_key().is_none() {
        issues.push(CheckIssue {
            name: "OPENAI_API_KEY".to_string(),
            hint: "Required for transcription: https://platform.openai.com/api-keys".to_string(),
        });
    }

    if settings.api.openrouter_key().is_none() {
        issues.push(CheckIssue {
            name: "OPENROUTER_API_KEY".to_string(),
            hint: "Used to reorganize transcripts into articles: https://openrouter.ai/keys"
                .to_string(),
        });
    }

    if settings.api.unsplash_key().is_none() {
        issues.push(CheckIssue {
            name: "UNSPLASH_ACCESS_KEY".to_string(),
            hint: "Used for social-post images: https://unsplash.com/developers".to_string(),
        });
    }

    issues
}

/// Get platform-specific install hint.
fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install yt-dlp"
            } else if cfg!(target_os = "linux") {
                "Install with: pip install yt-dlp"
            } else {
                "Install from: https://github.com/yt-dlp/yt-dlp"
            }
        }
        "ffmpeg" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install ffmpeg"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install ffmpeg"
            } else {
                "Install from: https://ffmpeg.org/download.html"
            }
        }
        _ => "Check the documentation for installation instructions",
    }
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint_ytdlp() {
        let hint = install_hint("yt-dlp");
        assert!(hint.contains("yt-dlp"));
    }

    #[test]
    fn test_install_hint_ffmpeg() {
        let hint = install_hint("ffmpeg");
        assert!(hint.contains("ffmpeg"));
    }

    #[test]
    fn test_default_settings_report_all_keys_missing() {
        let issues = check_api_keys(&Settings::default());
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].name, "OPENAI_API_KEY");
    }
}
