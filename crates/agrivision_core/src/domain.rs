//! crates/agrivision_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Apart from serde derives for the read-only reference data, these structs are
//! independent of any database or transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/register - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// The fields needed to create a user record. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// The classifier's verdict for one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease: String,
    pub confidence: f64,
    #[serde(default)]
    pub status: String,
}

/// One turn of the agronomist chat, as the browser keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "bot", alias = "model")]
    Assistant,
}

/// Languages the advisory and narration features can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Marathi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Bengali,
    Punjabi,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::English,
        Language::Hindi,
        Language::Marathi,
        Language::Gujarati,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Bengali,
        Language::Punjabi,
    ];

    /// The English name used inside prompts.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Bengali => "Bengali",
            Language::Punjabi => "Punjabi",
        }
    }

    /// BCP-47 tag for speech voices.
    pub fn voice_code(self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
            Language::Marathi => "mr-IN",
            Language::Gujarati => "gu-IN",
            Language::Tamil => "ta-IN",
            Language::Telugu => "te-IN",
            Language::Kannada => "kn-IN",
            Language::Bengali => "bn-IN",
            Language::Punjabi => "pa-IN",
        }
    }

    /// Accepts either the English name or the voice code, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.into_iter().find(|lang| {
            lang.name().eq_ignore_ascii_case(input)
                || lang.voice_code().eq_ignore_ascii_case(input)
                || lang.voice_code()[..2].eq_ignore_ascii_case(input)
        })
    }
}
