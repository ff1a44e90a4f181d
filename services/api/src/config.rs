//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service against the in-memory user store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub jwt_secret: String,
    pub secure_cookies: bool,
    pub cors_origin: String,
    pub static_dir: Option<PathBuf>,
    pub classifier_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub advisory_models: Vec<String>,
    pub advisory_max_fallbacks: usize,
    pub groq_api_key: Option<String>,
    pub chat_model: String,
    pub openai_api_key: Option<String>,
    pub tts_voice: String,
    pub openweather_api_key: Option<String>,
    pub weather_city: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address = parse("BIND_ADDRESS", &or_default("BIND_ADDRESS", "0.0.0.0:3000"))?;
        let database_url = var("DATABASE_URL");

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Auth ---
        let jwt_secret = required("JWT_SECRET")?;
        let secure_cookies = parse("SECURE_COOKIES", &or_default("SECURE_COOKIES", "false"))?;
        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:3000");
        let static_dir = var("STATIC_DIR").map(PathBuf::from);

        // --- Diagnosis & Advisory ---
        let classifier_url = required("CLASSIFIER_URL")?;
        let gemini_api_key = var("GEMINI_API_KEY");
        let gemini_api_base = or_default(
            "GEMINI_API_BASE",
            "https://generativelanguage.googleapis.com/v1beta",
        );
        let advisory_models: Vec<String> =
            or_default("ADVISORY_MODELS", "gemini-2.0-flash,gemini-flash-latest")
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        if advisory_models.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ADVISORY_MODELS".to_string(),
                "at least one model is required".to_string(),
            ));
        }
        let advisory_max_fallbacks = parse(
            "ADVISORY_MAX_FALLBACKS",
            &or_default("ADVISORY_MAX_FALLBACKS", "1"),
        )?;

        // --- Chat, Speech & Weather ---
        let groq_api_key = var("GROQ_API_KEY");
        let chat_model = or_default("CHAT_MODEL", "llama-3.3-70b-versatile");
        let openai_api_key = var("OPENAI_API_KEY");
        let tts_voice = or_default("TTS_VOICE", "alloy");
        let openweather_api_key = var("OPENWEATHER_API_KEY");
        let weather_city = or_default("WEATHER_CITY", "Pune");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            secure_cookies,
            cors_origin,
            static_dir,
            classifier_url,
            gemini_api_key,
            gemini_api_base,
            advisory_models,
            advisory_max_fallbacks,
            groq_api_key,
            chat_model,
            openai_api_key,
            tts_voice,
            openweather_api_key,
            weather_city,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("JWT_SECRET", "test-secret"),
        ("CLASSIFIER_URL", "http://classifier.local/predict"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = Config::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(
            config.advisory_models,
            vec!["gemini-2.0-flash", "gemini-flash-latest"]
        );
        assert_eq!(config.advisory_max_fallbacks, 1);
        assert_eq!(config.weather_city, "Pune");
        assert!(!config.secure_cookies);
    }

    #[test]
    fn missing_jwt_secret_is_reported() {
        let err = Config::from_lookup(lookup(&[("CLASSIFIER_URL", "http://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref k) if k == "JWT_SECRET"));
    }

    #[test]
    fn fallback_budget_is_independent_of_model_list() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("ADVISORY_MODELS", "a, b, c"));
        pairs.push(("ADVISORY_MAX_FALLBACKS", "0"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.advisory_models.len(), 3);
        assert_eq!(config.advisory_max_fallbacks, 0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("ADVISORY_MAX_FALLBACKS", "many"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue(ref k, _) if k == "ADVISORY_MAX_FALLBACKS"
        ));
    }
}
