//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::download::CookieStore;
use crate::platform::Platform;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Notat Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    // Check external tools
    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp(), true),
        check_tool("ffmpeg", "ffmpeg -version", install_hint_ffmpeg(), true),
        check_tool(
            "you-get",
            "you-get --version",
            "Optional Bilibili fallback. Install with: pip install you-get",
            false,
        ),
        check_tool(
            "youtube-dl",
            "youtube-dl --version",
            "Optional YouTube fallback. Install with: pip install youtube-dl",
            false,
        ),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    // Check API keys
    println!("{}", style("API Configuration").bold());
    let key_checks = check_api_keys(settings);
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    // Check directories and cookie files
    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Notat.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Notat is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
///
/// Optional tools report a warning instead of an error when missing.
fn check_tool(name: &str, version_cmd: &str, hint: &str, required: bool) -> CheckResult {
    let parts: Vec<&str> = version_cmd.split_whitespace().collect();
    let cmd = parts[0];
    let args = &parts[1..];

    match Command::new(cmd).args(args).output() {
        Ok(output) if output.status.success() => {
            // Try to extract version from first line
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            // Truncate long version strings
            let version_display = if version.len() > 50 {
                format!("{}...", &version[..50])
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) if required => CheckResult::error(name, "installed but not working", hint),
        Ok(_) => CheckResult::warning(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                CheckResult::error(name, "not found", hint)
            } else {
                CheckResult::warning(name, "not found", hint)
            }
        }
        Err(e) if required => CheckResult::error(name, &format!("error: {}", e), hint),
        Err(e) => CheckResult::warning(name, &format!("error: {}", e), hint),
    }
}

/// Check API keys from the loaded settings.
///
/// The OpenAI key is required (nothing can be transcribed without it); the
/// others degrade individual stages and only warn.
fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    match settings.api.openai_key() {
        Some(key) => results.push(CheckResult::ok(
            "OpenAI API key",
            &format!("configured ({})", mask_key(&key)),
        )),
        None => results.push(CheckResult::error(
            "OpenAI API key",
            "not configured",
            "Set with: export OPENAI_API_KEY='sk-...' (used for transcription)",
        )),
    }

    match settings.api.openrouter_key() {
        Some(key) => results.push(CheckResult::ok(
            "OpenRouter API key",
            &format!("configured ({})", mask_key(&key)),
        )),
        None => results.push(CheckResult::warning(
            "OpenRouter API key",
            "not configured",
            "Set with: export OPENROUTER_API_KEY='sk-or-...' (notes keep raw transcript wording without it)",
        )),
    }

    match settings.api.unsplash_key() {
        Some(key) => results.push(CheckResult::ok(
            "Unsplash access key",
            &format!("configured ({})", mask_key(&key)),
        )),
        None => results.push(CheckResult::warning(
            "Unsplash access key",
            "not configured",
            "Set with: export UNSPLASH_ACCESS_KEY='...' (social posts are generated without images)",
        )),
    }

    results
}

/// Mask a key for display, keeping only the edges.
fn mask_key(key: &str) -> String {
    if key.len() > 12 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        "set".to_string()
    }
}

/// Check output directory and per-platform cookie files.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let output_dir = settings.output_dir();
    if output_dir.exists() {
        let notes = std::fs::read_dir(&output_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
                    .count()
            })
            .unwrap_or(0);
        results.push(CheckResult::ok(
            "Output directory",
            &format!("{} ({} notes)", output_dir.display(), notes),
        ));
    } else {
        results.push(CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", output_dir.display()),
            "Directory is created on the first run",
        ));
    }

    let cookies = CookieStore::new(settings.cookie_dir());
    for platform in [Platform::Douyin, Platform::Bilibili, Platform::Youtube] {
        let name = format!("{} cookies", platform);
        match cookies.valid_cookie(platform) {
            Some(path) => results.push(CheckResult::ok(&name, &format!("{}", path.display()))),
            None => results.push(CheckResult::warning(
                &name,
                "not found",
                &format!(
                    "Export browser cookies to {} if {} downloads are denied",
                    cookies.cookie_path(platform).display(),
                    platform
                ),
            )),
        }
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: notat init (or notat config edit)",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key_keeps_edges_only() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-a...mnop");
        assert_eq!(mask_key("short"), "set");
    }

    #[test]
    fn test_missing_keys_degrade_not_fail() {
        let settings = Settings::default();
        let results = check_api_keys(&settings);
        assert_eq!(results.len(), 3);
        // Only the transcription key is a hard error.
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(results[1].status, CheckStatus::Warning);
        assert_eq!(results[2].status, CheckStatus::Warning);
    }
}
