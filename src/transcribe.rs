//! Speech-to-text over an OpenAI-compatible transcription endpoint.

use std::path::Path;

use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::error::{NotatError, Result};
use crate::openai::create_transcription_client;

/// Turns a local audio file into plain text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Whisper-backed transcription adapter.
///
/// Language hint and decoding temperature are fixed at construction; the
/// client is built once and reused for every call.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: String,
    temperature: f32,
}

impl WhisperTranscriber {
    pub fn new(settings: &Settings) -> Self {
        WhisperTranscriber {
            client: create_transcription_client(settings),
            model: settings.transcription.model.clone(),
            language: settings.transcription.language.clone(),
            temperature: settings.transcription.temperature,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    /// Transcribe an audio file to plain text.
    ///
    /// Errors here are soft at the pipeline level: the caller treats a failed
    /// or empty transcription as "nothing to process".
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .language(&self.language)
            .temperature(self.temperature)
            .build()
            .map_err(|e| NotatError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| NotatError::OpenAI(format!("Transcription API error: {}", e)))?;

        let text = response.text.trim().to_string();
        info!("Transcribed {} characters", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcriber_uses_configured_parameters() {
        let settings = Settings::default();
        let transcriber = WhisperTranscriber::new(&settings);
        assert_eq!(transcriber.model, "whisper-1");
        assert_eq!(transcriber.language, "zh");
    }
}
