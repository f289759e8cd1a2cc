//! Cover image search via the Unsplash API.

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{Prompts, Settings};
use crate::error::{NotatError, Result};
use crate::openai::{create_chat_client, create_http_client};

const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

/// Keyword-to-image lookup, with best-effort zh→en query translation for
/// better search recall.
pub struct ImageSearcher {
    http: reqwest::Client,
    chat: Option<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
    prompts: Prompts,
    access_key: Option<String>,
}

impl ImageSearcher {
    pub fn new(settings: &Settings) -> Self {
        let chat = settings
            .api
            .openrouter_key()
            .map(|_| create_chat_client(settings));

        ImageSearcher {
            http: create_http_client(),
            chat,
            model: settings.api.model.clone(),
            prompts: Prompts::default(),
            access_key: settings.api.unsplash_key(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Search landscape images for a keyword, returning up to `count` URLs.
    /// Without an access key this degrades to an empty list.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, count: u32) -> Result<Vec<String>> {
        let key = match &self.access_key {
            Some(key) => key,
            None => {
                warn!("No Unsplash access key configured, skipping image search");
                return Ok(Vec::new());
            }
        };

        let query = self.translate_query(query).await;
        let per_page = count.to_string();

        let response = self
            .http
            .get(UNSPLASH_SEARCH_URL)
            .header("Authorization", format!("Client-ID {key}"))
            .query(&[
                ("query", query.as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotatError::ImageSearch(format!(
                "Unsplash API error: HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        let urls: Vec<String> = parsed
            .results
            .into_iter()
            .map(|photo| photo.urls.regular)
            .collect();

        info!("Found {} image(s) for query", urls.len());
        Ok(urls)
    }

    /// Translate the query to English through the chat endpoint. Any failure
    /// keeps the original query.
    async fn translate_query(&self, query: &str) -> String {
        let client = match &self.chat {
            Some(client) => client,
            None => return query.to_string(),
        };

        match self.request_translation(client, query).await {
            Ok(translated) if !translated.is_empty() => {
                debug!("Translated image query: {} -> {}", query, translated);
                translated
            }
            Ok(_) => query.to_string(),
            Err(e) => {
                debug!("Query translation failed, using original: {}", e);
                query.to_string()
            }
        }
    }

    async fn request_translation(
        &self,
        client: &async_openai::Client<async_openai::config::OpenAIConfig>,
        query: &str,
    ) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.translate.system.clone())
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(query.to_string())
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| NotatError::Rewrite(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| NotatError::OpenAI(format!("Translation request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| NotatError::Rewrite("Empty response from model".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_searcher() -> ImageSearcher {
        ImageSearcher {
            http: create_http_client(),
            chat: None,
            model: "google/gemini-pro".to_string(),
            prompts: Prompts::default(),
            access_key: None,
        }
    }

    #[tokio::test]
    async fn test_search_without_key_returns_empty() {
        let searcher = offline_searcher();
        let urls = searcher.search("美食", 3).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_translate_without_chat_keeps_query() {
        let searcher = offline_searcher();
        assert_eq!(searcher.translate_query("美食").await, "美食");
    }

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "total": 2,
            "results": [
                {"urls": {"regular": "https://images.unsplash.com/photo-1"}},
                {"urls": {"regular": "https://images.unsplash.com/photo-2"}}
            ]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let urls: Vec<String> = parsed.results.into_iter().map(|p| p.urls.regular).collect();
        assert_eq!(
            urls,
            vec![
                "https://images.unsplash.com/photo-1",
                "https://images.unsplash.com/photo-2"
            ]
        );
    }
}
