//! services/api/src/bin/api.rs

use agrivision_core::advisory::{AdvisoryClient, AdvisoryPolicy};
use agrivision_core::ports::{ChatService, TextToSpeechService, UserStore, WeatherService};
use api_lib::{
    adapters::{
        DbAdapter, GeminiAdapter, HttpClassifierAdapter, InMemoryUserStore, OpenAiChatAdapter,
        OpenAiTtsAdapter, OpenWeatherAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        build_router,
        rest::ApiDoc,
        state::{AppState, NarrationRegistry},
        token::TokenSigner,
    },
};
use async_openai::{config::OpenAIConfig, types::audio::SpeechModel, Client};
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the User Store ---
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL not set; users are kept in memory and lost on restart.");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::new();

    let classifier = Arc::new(HttpClassifierAdapter::new(
        http.clone(),
        config.classifier_url.clone(),
    ));

    let policy = AdvisoryPolicy::new(
        config.advisory_models.clone(),
        config.advisory_max_fallbacks,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!(
        models = ?policy.models(),
        max_fallbacks = policy.max_fallbacks(),
        attempts = policy.attempt_order().len(),
        "Advisory policy configured."
    );
    let advisory = match &config.gemini_api_key {
        Some(key) => Some(AdvisoryClient::new(
            Arc::new(GeminiAdapter::new(
                http.clone(),
                config.gemini_api_base.clone(),
                key.clone(),
            )),
            policy,
        )),
        None => {
            warn!("GEMINI_API_KEY not set; advisory endpoint disabled.");
            None
        }
    };

    let chat = config.groq_api_key.as_ref().map(|key| {
        Arc::new(OpenAiChatAdapter::new(
            OpenAiChatAdapter::groq_client(key),
            config.chat_model.clone(),
        )) as Arc<dyn ChatService>
    });

    let tts = match &config.openai_api_key {
        Some(key) => {
            let voice = OpenAiTtsAdapter::parse_voice(&config.tts_voice).ok_or_else(|| {
                ApiError::Internal(format!(
                    "Invalid TTS voice specified in config: '{}'",
                    config.tts_voice
                ))
            })?;
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            Some(Arc::new(OpenAiTtsAdapter::new(openai_client, SpeechModel::Tts1Hd, voice))
                as Arc<dyn TextToSpeechService>)
        }
        None => None,
    };

    let weather = config.openweather_api_key.as_ref().map(|key| {
        Arc::new(OpenWeatherAdapter::new(http.clone(), key.clone())) as Arc<dyn WeatherService>
    });

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        users,
        config: config.clone(),
        tokens: TokenSigner::new(&config.jwt_secret),
        classifier,
        advisory,
        chat,
        weather,
        tts,
        narrations: Arc::new(NarrationRegistry::new()),
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(build_router(app_state))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
