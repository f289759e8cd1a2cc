//! Configuration settings for Notat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub transcription: TranscriptionSettings,
    pub pipeline: PipelineSettings,
    pub output: OutputSettings,
    pub cookies: CookieSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// API credentials and endpoints.
///
/// Keys left unset here are filled from their environment variables when
/// settings are loaded, so a config file never has to hold secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// OpenAI API key for transcription (env: OPENAI_API_KEY).
    pub openai_api_key: Option<String>,
    /// OpenRouter API key for rewriting (env: OPENROUTER_API_KEY).
    pub openrouter_api_key: Option<String>,
    /// Referer header sent to OpenRouter.
    pub openrouter_referer: String,
    /// Application name sent to OpenRouter as X-Title.
    pub openrouter_app_name: String,
    /// Unsplash access key for image search (env: UNSPLASH_ACCESS_KEY).
    pub unsplash_access_key: Option<String>,
    /// Chat model used for rewriting and the style transform.
    pub model: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openrouter_api_key: None,
            openrouter_referer: "https://github.com".to_string(),
            openrouter_app_name: "notat".to_string(),
            unsplash_access_key: None,
            model: "google/gemini-pro".to_string(),
        }
    }
}

impl ApiSettings {
    /// OpenAI key for transcription, when configured.
    pub fn openai_key(&self) -> Option<String> {
        self.openai_api_key.clone().filter(|k| !k.is_empty())
    }

    /// OpenRouter key for rewriting, when configured.
    pub fn openrouter_key(&self) -> Option<String> {
        self.openrouter_api_key.clone().filter(|k| !k.is_empty())
    }

    /// Unsplash access key for image search, when configured.
    pub fn unsplash_key(&self) -> Option<String> {
        self.unsplash_access_key.clone().filter(|k| !k.is_empty())
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().map_or(true, |k| k.is_empty()) {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                *slot = Some(value);
            }
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription model to use.
    pub model: String,
    /// Language hint passed to the transcription service.
    pub language: String,
    /// Decoding temperature. Fixed configuration, never tuned per call.
    pub temperature: f32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: "zh".to_string(),
            temperature: 0.0,
        }
    }
}

/// Settings for the rewrite pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Maximum characters per chunk sent to the rewrite service.
    pub max_chars: usize,
    /// Sampling temperature for rewrite calls.
    pub temperature: f32,
    /// Token budget for per-chunk and coherence rewrite responses.
    pub rewrite_max_tokens: u32,
    /// Token budget for the social-post transform response.
    pub style_max_tokens: u32,
    /// How many images to attach to the social-post artifact.
    pub image_count: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_chars: 2000,
            temperature: 0.7,
            rewrite_max_tokens: 4000,
            style_max_tokens: 3000,
            image_count: 3,
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory the Markdown artifacts are written to.
    pub directory: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: "generated_notes".to_string(),
        }
    }
}

/// Platform cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct CookieSettings {
    /// Directory holding `{platform}_cookies.txt` files. Defaults to
    /// `cookies/` under the config directory.
    pub directory: Option<String>,
}


/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };
        settings.apply_env_fallbacks();
        Ok(settings)
    }

    /// Fill unset API keys from the environment. Runs once at load time so
    /// the rest of the program only reads explicit configuration.
    pub fn apply_env_fallbacks(&mut self) {
        fill_from_env(&mut self.api.openai_api_key, "OPENAI_API_KEY");
        fill_from_env(&mut self.api.openrouter_api_key, "OPENROUTER_API_KEY");
        fill_from_env(&mut self.api.unsplash_access_key, "UNSPLASH_ACCESS_KEY");
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::NotatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the application configuration directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notat")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.output.directory)
    }

    /// Get the expanded cookie directory path.
    pub fn cookie_dir(&self) -> PathBuf {
        match &self.cookies.directory {
            Some(dir) => Self::expand_path(dir),
            None => Self::config_dir().join("cookies"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pipeline.max_chars, 2000);
        assert_eq!(settings.pipeline.rewrite_max_tokens, 4000);
        assert_eq!(settings.pipeline.style_max_tokens, 3000);
        assert_eq!(settings.pipeline.image_count, 3);
        assert_eq!(settings.transcription.language, "zh");
        assert_eq!(settings.api.model, "google/gemini-pro");
        assert_eq!(settings.output.directory, "generated_notes");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [pipeline]
            max_chars = 1200

            [api]
            model = "anthropic/claude-3-haiku"
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.pipeline.max_chars, 1200);
        assert_eq!(settings.api.model, "anthropic/claude-3-haiku");
        // Untouched sections keep their defaults.
        assert_eq!(settings.pipeline.temperature, 0.7);
        assert_eq!(settings.transcription.model, "whisper-1");
    }

    #[test]
    fn test_key_accessors_ignore_empty_strings() {
        let api = ApiSettings {
            openrouter_api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(api.openrouter_key().as_deref(), Some("from-config"));

        let empty = ApiSettings {
            openrouter_api_key: Some(String::new()),
            ..Default::default()
        };
        // Empty strings do not count as configured.
        assert_eq!(empty.openrouter_key(), None);
        assert_eq!(ApiSettings::default().openai_key(), None);
    }

    #[test]
    fn test_env_fallback_fills_unset_keys_only() {
        let mut settings = Settings::default();
        settings.api.openrouter_api_key = Some("keep-me".to_string());
        settings.apply_env_fallbacks();
        assert_eq!(settings.api.openrouter_key().as_deref(), Some("keep-me"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.pipeline.max_chars = 987;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.pipeline.max_chars, 987);
    }
}
