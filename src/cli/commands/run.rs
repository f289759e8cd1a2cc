//! Run command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::links;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the note generation pipeline over one or more video links.
pub async fn run_run(
    input: &str,
    post: bool,
    output_dir: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Run) {
        Output::error(&format!("{}", e));
        Output::info("Run 'notat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(dir) = output_dir {
        settings.output.directory = dir;
    }

    // Missing keys degrade stages instead of aborting; surface them up front
    // so a fully silent run is never a surprise.
    if settings.api.openai_key().is_none() {
        Output::warning(
            "No OpenAI API key configured; transcription will fail and no notes will be written.",
        );
    }
    if settings.api.openrouter_key().is_none() {
        Output::warning(
            "No OpenRouter API key configured; notes will keep the raw transcript wording.",
        );
    }

    let urls = links::extract_urls(input)?;
    let output_display = settings.output_dir().display().to_string();

    let pipeline = Pipeline::new(settings)?;

    if urls.len() == 1 {
        return run_single(&pipeline, &urls[0], post, &output_display).await;
    }
    run_batch(&pipeline, &urls, post, &output_display).await
}

/// Process one link, failing the process on a hard error.
async fn run_single(pipeline: &Pipeline, url: &str, post: bool, output_dir: &str) -> Result<()> {
    Output::info(&format!("Processing: {}", url));
    Output::kv("Output directory", output_dir);

    match pipeline.process_video(url, post).await {
        Ok(files) if files.is_empty() => {
            Output::warning("No notes were generated.");
        }
        Ok(files) => {
            Output::success(&format!("Generated {} file(s):", files.len()));
            for file in &files {
                Output::list_item(&file.display().to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to process: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Process every link, logging failures and moving on.
async fn run_batch(
    pipeline: &Pipeline,
    urls: &[String],
    post: bool,
    output_dir: &str,
) -> Result<()> {
    let total = urls.len();
    Output::info(&format!("Found {} links to process", total));
    Output::kv("Output directory", output_dir);
    println!();

    let mut success_count = 0;
    let mut empty_count = 0;
    let mut error_count = 0;

    for (i, url) in urls.iter().enumerate() {
        let progress = format!("[{}/{}]", i + 1, total);
        Output::info(&format!("{} Processing: {}", progress, url));

        match pipeline.process_video(url, post).await {
            Ok(files) if files.is_empty() => {
                Output::warning("  No notes generated");
                empty_count += 1;
            }
            Ok(files) => {
                Output::success(&format!("  Generated {} file(s)", files.len()));
                success_count += 1;
            }
            Err(e) => {
                Output::error(&format!("  Failed: {}", e));
                error_count += 1;
            }
        }
    }

    println!();
    Output::info(&format!(
        "Batch complete: {} succeeded, {} produced nothing, {} failed",
        success_count, empty_count, error_count
    ));

    Ok(())
}
