//! crates/agrivision_core/src/advisory.rs
//!
//! The expert advisory: one fixed prompt sent to an ordered list of text
//! generation models, falling through to the next model only when the previous
//! one reports a transient capacity problem.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Language;
use crate::ports::{PortError, TextGenerationService};

const PROMPT_TEMPLATE: &str = r#"
Context: AgriVision AI detected {disease} with {confidence}% confidence.
Task: Act as a senior Agronomist in Maharashtra.
Language: Provide the response entirely in {language}.
Format: Use clear headings, bullet points, and DOUBLE line breaks.

Structure:
### 1. Disease Overview
### 2. Treatment Strategy
### 3. Local Solutions (Chemicals in Pune/Nashik)
### 4. Prevention Tips
"#;

pub const ALL_BUSY_MESSAGE: &str =
    "All advisory providers are currently busy. Please try again in 10 seconds.";

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// Every attempt allowed by the fallback budget hit a transient error.
    #[error("{}", ALL_BUSY_MESSAGE)]
    AllBusy { attempts: usize },
    /// A provider failed in a way another model would not fix.
    #[error("Advisory provider failed: {0}")]
    Provider(#[source] PortError),
    #[error("Advisory configuration error: {0}")]
    Config(String),
}

/// Which models to try and how many fallbacks are allowed after the primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryPolicy {
    models: Vec<String>,
    max_fallbacks: usize,
}

impl AdvisoryPolicy {
    pub fn new(models: Vec<String>, max_fallbacks: usize) -> Result<Self, AdvisoryError> {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            return Err(AdvisoryError::Config(
                "at least one advisory model is required".to_string(),
            ));
        }
        Ok(Self {
            models,
            max_fallbacks,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn max_fallbacks(&self) -> usize {
        self.max_fallbacks
    }

    /// The models actually tried, in order. The budget caps this independently
    /// of how many models are listed.
    pub fn attempt_order(&self) -> &[String] {
        let attempts = self.models.len().min(self.max_fallbacks.saturating_add(1));
        &self.models[..attempts]
    }
}

/// Builds the advisory prompt for one diagnosis.
pub fn build_prompt(disease: &str, confidence: f64, language: Language) -> String {
    PROMPT_TEMPLATE
        .replace("{disease}", disease)
        .replace("{confidence}", &format_confidence(confidence))
        .replace("{language}", language.name())
}

fn format_confidence(confidence: f64) -> String {
    // 92.4 stays 92.4, 97.0 prints as 97
    let rounded = (confidence * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Generates advisories against a `TextGenerationService` under an `AdvisoryPolicy`.
#[derive(Clone)]
pub struct AdvisoryClient {
    provider: Arc<dyn TextGenerationService>,
    policy: AdvisoryPolicy,
}

impl AdvisoryClient {
    pub fn new(provider: Arc<dyn TextGenerationService>, policy: AdvisoryPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn generate(
        &self,
        disease: &str,
        confidence: f64,
        language: Language,
    ) -> Result<String, AdvisoryError> {
        let prompt = build_prompt(disease, confidence, language);
        let order = self.policy.attempt_order();

        for (attempt, model) in order.iter().enumerate() {
            match self.provider.generate(model, &prompt).await {
                Ok(text) => {
                    info!(model = %model, attempt, "advisory generated");
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    warn!(model = %model, error = %e, "advisory model busy");
                }
                Err(e) => return Err(AdvisoryError::Provider(e)),
            }
        }

        Err(AdvisoryError::AllBusy {
            attempts: order.len(),
        })
    }
}
