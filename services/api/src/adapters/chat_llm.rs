//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the agronomist chat LLM.
//! It implements the `ChatService` port from the `core` crate against any
//! OpenAI-compatible endpoint (Groq in production).

use agrivision_core::domain::{ChatRole, ChatTurn};
use agrivision_core::ports::{ChatService, PortError, PortResult};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

const SYSTEM_INSTRUCTIONS: &str = "You are the AgriVision 2.0 Expert Agronomist. Provide technical, clear, and structured advice for soybean and grape crops. Keep responses to 2-3 short paragraphs maximum. Use bold text for key terms and bullet points for steps.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// A client pointed at Groq's OpenAI-compatible API.
    pub fn groq_client(api_key: &str) -> Client<OpenAIConfig> {
        Client::with_config(
            OpenAIConfig::new()
                .with_api_base(GROQ_API_BASE)
                .with_api_key(api_key),
        )
    }
}

fn build_messages(
    history: &[ChatTurn],
    user_message: &str,
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_INSTRUCTIONS)
            .build()?
            .into(),
    );
    for turn in history {
        let message = match turn.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.text.as_str())
                .build()?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.text.as_str())
                .build()?
                .into(),
        };
        messages.push(message);
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?
            .into(),
    );
    Ok(messages)
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    async fn reply(&self, history: &[ChatTurn], user_message: &str) -> PortResult<String> {
        let messages = build_messages(history, user_message)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
