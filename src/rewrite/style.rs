//! Social-post style transform.
//!
//! Converts the organized article into a short-form post (titles, body,
//! hashtags). The model is asked for labelled `TITLES` / `CONTENT` / `TAGS`
//! sections; [`parse_social_post`] turns the reply back into structure, with
//! a fixed fallback order for replies that drift from the format.

use std::collections::HashMap;

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::config::{Prompts, Settings};
use crate::error::{NotatError, Result};
use crate::openai::create_chat_client;

/// Fallback cover title for posts the model could not name.
pub const FALLBACK_TITLE: &str = "笔记";

/// A short-form social post: candidate titles, body, hashtags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    pub titles: Vec<String>,
    pub body: String,
    pub tags: Vec<String>,
}

impl SocialPost {
    /// Post wrapping an unstyled document, used when the transform degrades.
    pub fn fallback(document: &str) -> Self {
        SocialPost {
            titles: vec![FALLBACK_TITLE.to_string()],
            body: document.to_string(),
            tags: Vec::new(),
        }
    }

    /// The first title, or the fixed fallback when none parsed.
    pub fn cover_title(&self) -> &str {
        self.titles
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_TITLE)
    }
}

/// One-shot document-to-post transform over the chat endpoint.
pub struct StyleTransformer {
    client: Option<async_openai::Client<async_openai::config::OpenAIConfig>>,
    model: String,
    prompts: Prompts,
    temperature: f32,
    max_tokens: u32,
}

impl StyleTransformer {
    pub fn new(settings: &Settings) -> Self {
        let client = settings
            .api
            .openrouter_key()
            .map(|_| create_chat_client(settings));

        StyleTransformer {
            client,
            model: settings.api.model.clone(),
            prompts: Prompts::default(),
            temperature: settings.pipeline.temperature,
            max_tokens: settings.pipeline.style_max_tokens,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Transform an organized document into a social post. Soft-fails to a
    /// plain post carrying the document unchanged.
    #[instrument(skip_all, fields(chars = document.chars().count()))]
    pub async fn transform(&self, document: &str) -> SocialPost {
        let client = match &self.client {
            Some(client) => client,
            None => {
                warn!("No rewrite endpoint configured, skipping style transform");
                return SocialPost::fallback(document);
            }
        };

        match self.request_post(client, document).await {
            Ok(raw) => {
                let preview: String = raw.chars().take(120).collect();
                debug!("Style response preview: {}", preview);
                parse_social_post(&raw)
            }
            Err(e) => {
                warn!("Style transform failed, using plain note: {}", e);
                SocialPost::fallback(document)
            }
        }
    }

    async fn request_post(
        &self,
        client: &async_openai::Client<async_openai::config::OpenAIConfig>,
        document: &str,
    ) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), document.to_string());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.social.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.social.system.clone())
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
            .map_err(|e| NotatError::OpenAI(format!("Style request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| NotatError::Rewrite("Empty response from model".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Titles,
    Content,
    Tags,
}

const SECTION_LABELS: [&str; 3] = ["TITLES", "CONTENT", "TAGS"];

/// Parse a model reply into a [`SocialPost`].
///
/// Fallback order:
/// 1. Labelled sections: blank-line-separated sections are walked with a
///    cursor; a section starting with a label switches the cursor, any other
///    section is appended to the part the cursor points at.
/// 2. No `TITLES` section: the title is the first line containing no heading
///    marker, no colon, and no sentence-terminal punctuation.
/// 3. No `CONTENT` body: the body is the full reply minus label lines and
///    the chosen title line.
/// 4. Tags are always every `#`-word token in the reply, in order of
///    appearance, duplicates kept as found.
pub fn parse_social_post(raw: &str) -> SocialPost {
    let mut titles = Vec::new();
    let mut body = String::new();

    let mut current = Section::None;
    for section in raw.split("\n\n") {
        let trimmed = section.trim();
        if trimmed.starts_with("TITLES") {
            current = Section::Titles;
        } else if trimmed.starts_with("CONTENT") {
            current = Section::Content;
        } else if trimmed.starts_with("TAGS") {
            current = Section::Tags;
        } else if !trimmed.is_empty() {
            match current {
                Section::Titles => titles.push(trimmed.to_string()),
                Section::Content => {
                    body.push_str(trimmed);
                    body.push_str("\n\n");
                }
                // Tags come from the whole-reply scan below.
                Section::Tags | Section::None => {}
            }
        }
    }
    let mut body = body.trim().to_string();

    if titles.is_empty() {
        if let Some(title) = heuristic_title(raw) {
            titles.push(title);
        }
    }

    if body.is_empty() {
        let title = titles.first().map(String::as_str);
        body = residual_body(raw, title);
    }

    let tag_re = Regex::new(r"#\w+").expect("Invalid regex");
    let tags = tag_re
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect();

    SocialPost { titles, body, tags }
}

/// First line that looks like a bare title: no heading marker, no colon, no
/// sentence-terminal punctuation, and not a section label.
fn heuristic_title(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !SECTION_LABELS.iter().any(|label| line.starts_with(label)))
        .find(|line| {
            !line.contains('#')
                && !line.contains(':')
                && !line.contains('：')
                && !line.contains(['。', '！', '？', '.', '!', '?'])
        })
        .map(String::from)
}

/// The reply stripped of section-label lines and the chosen title line.
fn residual_body(raw: &str, title: Option<&str>) -> String {
    let mut title_taken = false;
    raw.lines()
        .filter(|line| {
            let trimmed = line.trim();
            if SECTION_LABELS.iter().any(|label| trimmed.starts_with(label)) {
                return false;
            }
            if !title_taken && Some(trimmed) == title {
                title_taken = true;
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labelled_sections() {
        let raw = "TITLES\n\n✨三个月逆袭指南\n\nCONTENT\n\n第一段正文\n\n第二段正文\n\nTAGS\n\n#学习 #干货";
        let post = parse_social_post(raw);

        assert_eq!(post.titles, vec!["✨三个月逆袭指南"]);
        assert_eq!(post.body, "第一段正文\n\n第二段正文");
        assert_eq!(post.tags, vec!["#学习", "#干货"]);
    }

    #[test]
    fn test_parse_label_sharing_section_falls_back() {
        // Items on the same blank-line section as their label are dropped by
        // the cursor walk; the line heuristics recover them.
        let raw = "TITLES\n瘦身秘诀大公开\n\nCONTENT\n这是正文。";
        let post = parse_social_post(raw);

        assert_eq!(post.titles, vec!["瘦身秘诀大公开"]);
        assert_eq!(post.body, "这是正文。");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_title_heuristic_skips_markers() {
        let raw = "# 大标题\n提示：注意事项\n这才是标题\n这是完整的句子。";
        let post = parse_social_post(raw);

        assert_eq!(post.titles, vec!["这才是标题"]);
        // Residual body keeps every non-label line except the title.
        assert_eq!(post.body, "# 大标题\n提示：注意事项\n这是完整的句子。");
    }

    #[test]
    fn test_tags_in_order_with_duplicates() {
        let raw = "开头提到#好物 的内容\n\nTAGS\n\n#好物 #分享 #好物";
        let post = parse_social_post(raw);

        assert_eq!(post.tags, vec!["#好物", "#好物", "#分享", "#好物"]);
    }

    #[test]
    fn test_tags_collected_from_body_text() {
        let raw = "TITLES\n\n宝藏标题\n\nCONTENT\n\n正文里夹着 #效率 工具推荐";
        let post = parse_social_post(raw);

        assert_eq!(post.tags, vec!["#效率"]);
        assert_eq!(post.body, "正文里夹着 #效率 工具推荐");
    }

    #[test]
    fn test_parse_empty_reply() {
        let post = parse_social_post("");
        assert!(post.titles.is_empty());
        assert!(post.body.is_empty());
        assert!(post.tags.is_empty());
        assert_eq!(post.cover_title(), FALLBACK_TITLE);
    }

    #[test]
    fn test_multiple_titles_collected() {
        let raw = "TITLES\n\n标题一\n\n标题二\n\n标题三\n\nCONTENT\n\n正文";
        let post = parse_social_post(raw);

        assert_eq!(post.titles, vec!["标题一", "标题二", "标题三"]);
        assert_eq!(post.cover_title(), "标题一");
    }

    #[test]
    fn test_fallback_post_wraps_document() {
        let post = SocialPost::fallback("原始文档内容");
        assert_eq!(post.titles, vec![FALLBACK_TITLE]);
        assert_eq!(post.body, "原始文档内容");
        assert!(post.tags.is_empty());
    }
}
