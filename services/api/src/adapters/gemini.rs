//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's Gemini `generateContent` REST API.
//! It implements the `TextGenerationService` port from the `core` crate, and is
//! the provider behind the expert advisory.

use agrivision_core::ports::{PortError, PortResult, TextGenerationService};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Rate limiting and overload are worth another model; everything else is not.
pub fn classify_status(status: StatusCode, body: &str) -> PortError {
    let message = format!("{}: {}", status, body.chars().take(200).collect::<String>());
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            PortError::Unavailable(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        _ => PortError::Unexpected(message),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct GeminiAdapter {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapter`.
    pub fn new(http: reqwest::Client, api_base: String, api_key: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for GeminiAdapter {
    async fn generate(&self, model: &str, prompt: &str) -> PortResult<String> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .text()
            .ok_or_else(|| PortError::Unexpected("Gemini response contained no text.".to_string()))
    }
}
