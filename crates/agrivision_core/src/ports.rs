//! crates/agrivision_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ChatTurn, Diagnosis, NewUser, User, UserCredentials};
use crate::weather::WeatherReading;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    /// The provider is temporarily out of capacity (rate limited or overloaded).
    #[error("Service temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

impl PortError {
    /// Whether a retry against another provider may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Unavailable(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. Fails with `AlreadyExists` if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;
}

#[async_trait]
pub trait DiagnosisService: Send + Sync {
    /// Sends one image to the classifier and returns its verdict.
    async fn diagnose(&self, file_name: &str, image: Vec<u8>) -> PortResult<Diagnosis>;
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Runs a single prompt against the named model.
    async fn generate(&self, model: &str, prompt: &str) -> PortResult<String>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn reply(&self, history: &[ChatTurn], user_message: &str) -> PortResult<String>;
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, city: &str) -> PortResult<WeatherReading>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>>;
}
