//! services/api/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service,
//! used to narrate advisories. It implements the `TextToSpeechService` port from
//! the `core` crate.

use agrivision_core::ports::{PortError, PortResult, TextToSpeechService};
use async_openai::{
    config::OpenAIConfig,
    types::audio::{CreateSpeechRequest, SpeechModel, Voice},
    Client, error::OpenAIError,
};
use async_trait::async_trait;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TextToSpeechService` port using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: SpeechModel, voice: Voice) -> Self {
        Self {
            client,
            model,
            voice,
        }
    }

    /// Maps a configured voice name onto the API's voice set.
    pub fn parse_voice(name: &str) -> Option<Voice> {
        match name.to_lowercase().as_str() {
            "alloy" => Some(Voice::Alloy),
            "echo" => Some(Voice::Echo),
            "fable" => Some(Voice::Fable),
            "onyx" => Some(Voice::Onyx),
            "nova" => Some(Voice::Nova),
            "shimmer" => Some(Voice::Shimmer),
            _ => None,
        }
    }
}

//=========================================================================================
// `TextToSpeechService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextToSpeechService for OpenAiTtsAdapter {
    /// Generates MP3 audio from the given text. The model picks up the language
    /// from the text itself.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>> {
        let request = CreateSpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: self.voice.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .speech()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.bytes.to_vec())
    }
}
