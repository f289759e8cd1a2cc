//! LLM-backed transcript organization.
//!
//! Long transcripts are segmented into bounded chunks, rewritten one chunk at
//! a time, reassembled in document order, and finally smoothed by a single
//! coherence pass. Every step degrades instead of failing: a chunk that
//! cannot be rewritten keeps its original text, and a failed coherence pass
//! keeps the plain concatenation.

pub mod style;

pub use style::{parse_social_post, SocialPost, StyleTransformer};

use std::collections::HashMap;

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use tracing::{info, instrument, warn};

use crate::config::{Prompts, Settings};
use crate::error::{NotatError, Result};
use crate::openai::create_chat_client;
use crate::segment::{reassemble, segment, Chunk, RewrittenChunk};

/// Chunked rewriting of a transcript into an organized article.
pub struct Rewriter {
    client: Option<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
    prompts: Prompts,
    max_chars: usize,
    temperature: f32,
    max_tokens: u32,
}

impl Rewriter {
    pub fn new(settings: &Settings) -> Self {
        let client = settings
            .api
            .openrouter_key()
            .map(|_| create_chat_client(settings));

        Rewriter {
            client,
            model: settings.api.model.clone(),
            prompts: Prompts::default(),
            max_chars: settings.pipeline.max_chars,
            temperature: settings.pipeline.temperature,
            max_tokens: settings.pipeline.rewrite_max_tokens,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Organize a transcript into a structured article. Never fails: with no
    /// rewrite endpoint the transcript passes through unchanged, and each
    /// chunk that cannot be rewritten keeps its original text.
    #[instrument(skip_all, fields(chars = transcript.chars().count()))]
    pub async fn organize(&self, transcript: &str) -> String {
        let client = match &self.client {
            Some(client) => client,
            None => {
                warn!("No rewrite endpoint configured, keeping transcript as-is");
                return transcript.to_string();
            }
        };

        let chunks = segment(transcript, self.max_chars);
        if chunks.is_empty() {
            return String::new();
        }

        let total = chunks.len();
        info!("Organizing transcript in {} part(s)", total);

        let mut rewritten = Vec::with_capacity(total);
        for chunk in &chunks {
            let text = match self.organize_chunk(client, chunk, total).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "Rewrite of part {}/{} failed, keeping original text: {}",
                        chunk.index + 1,
                        total,
                        e
                    );
                    chunk.body.clone()
                }
            };
            rewritten.push(RewrittenChunk {
                index: chunk.index,
                text,
            });
        }

        let combined = reassemble(rewritten);

        if total > 1 {
            match self.smooth(client, &combined).await {
                Ok(text) => return text,
                Err(e) => warn!("Coherence pass failed, keeping concatenated parts: {}", e),
            }
        }

        combined
    }

    /// Rewrite one chunk, with its position context and continuity preamble.
    async fn organize_chunk(
        &self,
        client: &async_openai::Client<async_openai::config::OpenAIConfig>,
        chunk: &Chunk,
        total: usize,
    ) -> Result<String> {
        let context = if total > 1 {
            format!("这是文章的第 {}/{} 部分。", chunk.index + 1, total)
        } else {
            String::new()
        };

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("content".to_string(), chunk.contextual_text());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.organize.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.organize.system.clone())
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| NotatError::Rewrite(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| NotatError::OpenAI(format!("Rewrite request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| NotatError::Rewrite("Empty response from model".to_string()))?;

        Ok(content.trim().to_string())
    }

    /// One pass over the reassembled document to smooth part transitions.
    async fn smooth(
        &self,
        client: &async_openai::Client<async_openai::config::OpenAIConfig>,
        document: &str,
    ) -> Result<String> {
        info!("Running coherence pass");

        let mut vars = HashMap::new();
        vars.insert("content".to_string(), document.to_string());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.coherence.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.organize.system.clone())
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| NotatError::Rewrite(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| NotatError::Rewrite(e.to_string()))?;

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| NotatError::OpenAI(format!("Coherence request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| NotatError::Rewrite("Empty response from model".to_string()))?;

        Ok(content.trim().to_string())
    }
}
