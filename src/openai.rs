//! API client configuration with sensible defaults.
//!
//! Two OpenAI-compatible clients are used: the transcription endpoint talks
//! to OpenAI directly, while chat completions (rewriting, style transform,
//! query translation) go through OpenRouter with its identification headers.

use async_openai::{config::OpenAIConfig, Client};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

use crate::config::Settings;

/// OpenRouter's OpenAI-compatible API base.
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create the transcription client with configured timeout.
///
/// Uses a 5-minute timeout to prevent hung API calls. The API key comes
/// from settings or the `OPENAI_API_KEY` environment variable.
pub fn create_transcription_client(settings: &Settings) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::default();
    if let Some(key) = settings.api.openai_key() {
        config = config.with_api_key(key);
    }
    Client::with_config(config).with_http_client(create_http_client())
}

/// Create the chat-completion client, routed through OpenRouter.
///
/// OpenRouter wants `HTTP-Referer` and `X-Title` headers identifying the
/// calling application; they ride along as default headers on the underlying
/// HTTP client.
pub fn create_chat_client(settings: &Settings) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::default().with_api_base(OPENROUTER_API_BASE);
    if let Some(key) = settings.api.openrouter_key() {
        config = config.with_api_key(key);
    }

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&settings.api.openrouter_referer) {
        headers.insert("HTTP-Referer", value);
    }
    if let Ok(value) = HeaderValue::from_str(&settings.api.openrouter_app_name) {
        headers.insert("X-Title", value);
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(config).with_http_client(http_client)
}

/// Create a plain HTTP client with the shared timeout, for non-OpenAI
/// endpoints (page scraping, image search).
pub fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
}
