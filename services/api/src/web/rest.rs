//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the diagnosis, advisory, chat, weather,
//! treatment, and narration endpoints, and the master definition for the
//! OpenAPI specification.

use crate::adapters::classifier::CONNECT_FAILURE;
use crate::error::{ApiError, ApiResult};
use crate::web::auth::{
    AuthResponse, LoginRequest, RegisterRequest, SessionResponse, UserView,
};
use crate::web::extract::ApiJson;
use crate::web::middleware::path_with_query;
use crate::web::state::AppState;
use crate::web::token::Claims;
use agrivision_core::domain::{ChatTurn, Language};
use agrivision_core::narration::clean_for_speech;
use agrivision_core::ports::PortError;
use agrivision_core::treatments::{self, TreatmentInfo, TreatmentLang};
use agrivision_core::weather::{self, OutbreakHotspot, RiskAdvisory, WeatherReading};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Json},
    Extension,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::auth::me_handler,
        crate::web::auth::logout_handler,
        diagnose_handler,
        advisory_handler,
        chat_handler,
        weather_handler,
        treatment_handler,
        narrate_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, SessionResponse, UserView,
            DiagnoseResponse, AdvisoryRequest, AdvisoryResponse, ChatRequest, ChatResponse,
            WeatherResponse, NarrateRequest,
        )
    ),
    tags(
        (name = "AgriVision API", description = "Crop disease diagnosis, expert advisory, and farm weather.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct DiagnoseResponse {
    pub disease: String,
    pub confidence: f64,
    pub status: String,
    #[schema(value_type = Object)]
    pub treatment: TreatmentInfo,
    /// Where the browser shows this result.
    pub results_path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AdvisoryRequest {
    pub disease: String,
    pub confidence: f64,
    /// Language name or voice code; English when absent.
    pub language: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AdvisoryResponse {
    pub advisory: String,
    pub language: String,
    pub voice_code: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatTurn>,
    pub user_message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub text: String,
}

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WeatherResponse {
    #[schema(value_type = Object)]
    pub reading: WeatherReading,
    pub simulated: bool,
    pub reason: Option<String>,
    #[schema(value_type = Object)]
    pub advisory: RiskAdvisory,
    #[schema(value_type = Vec<Object>)]
    pub hotspots: Vec<OutbreakHotspot>,
}

#[derive(Deserialize)]
pub struct TreatmentQuery {
    pub lang: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct NarrateRequest {
    pub text: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Diagnose a leaf photo.
///
/// Accepts a multipart/form-data request with the image in a `file` part.
#[utoipa::path(
    post,
    path = "/api/diagnose",
    request_body(content_type = "multipart/form-data", description = "The image to classify."),
    responses(
        (status = 200, description = "Classifier verdict", body = DiagnoseResponse),
        (status = 400, description = "No image in the request"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Classifier unreachable")
    )
)]
pub async fn diagnose_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<DiagnoseResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("scan.jpg").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read file bytes: {}", e)))?;
        upload = Some((name, data));
        break;
    }

    let (file_name, data) = upload
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| ApiError::Validation("Multipart form must include a file".to_string()))?;

    let diagnosis = app_state
        .classifier
        .diagnose(&file_name, data.to_vec())
        .await
        .map_err(|_| ApiError::Upstream(CONNECT_FAILURE.to_string()))?;

    info!(disease = %diagnosis.disease, confidence = diagnosis.confidence, "image diagnosed");

    let treatment = treatments::lookup_or_generic(&diagnosis.disease, TreatmentLang::En);
    let results_path = path_with_query(
        "/results",
        &[
            ("disease", diagnosis.disease.as_str()),
            ("confidence", diagnosis.confidence.to_string().as_str()),
        ],
    );

    Ok(Json(DiagnoseResponse {
        disease: diagnosis.disease,
        confidence: diagnosis.confidence,
        status: diagnosis.status,
        treatment,
        results_path,
    }))
}

/// Generate the expert advisory for a diagnosis.
#[utoipa::path(
    post,
    path = "/api/advisory",
    request_body = AdvisoryRequest,
    responses(
        (status = 200, description = "Generated advisory", body = AdvisoryResponse),
        (status = 400, description = "Unsupported language or bad input"),
        (status = 401, description = "Not authenticated"),
        (status = 502, description = "Provider failed"),
        (status = 503, description = "All providers busy")
    )
)]
pub async fn advisory_handler(
    State(app_state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AdvisoryRequest>,
) -> ApiResult<Json<AdvisoryResponse>> {
    let language = match req.language.as_deref() {
        None => Language::default(),
        Some(raw) => Language::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("Unsupported language: {}", raw)))?,
    };
    let disease = req.disease.trim();
    if disease.is_empty() {
        return Err(ApiError::Validation("Please provide a disease".to_string()));
    }
    if !req.confidence.is_finite() {
        return Err(ApiError::Validation("Confidence must be a number".to_string()));
    }

    let advisory = app_state.advisory.as_ref().ok_or_else(|| {
        ApiError::Port(PortError::Unavailable(
            "Advisory provider is not configured".to_string(),
        ))
    })?;

    // The display name reads better in the prompt than the raw classifier label.
    let display_name = treatments::lookup_or_generic(disease, TreatmentLang::En).name;
    let text = advisory
        .generate(&display_name, req.confidence, language)
        .await?;

    Ok(Json(AdvisoryResponse {
        advisory: text,
        language: language.name().to_string(),
        voice_code: language.voice_code().to_string(),
    }))
}

/// Ask the agronomist chat a question.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Chat reply", body = ChatResponse),
        (status = 502, description = "Chat provider failed")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    if req.user_message.trim().is_empty() {
        return Err(ApiError::Validation("Please provide a message".to_string()));
    }
    let chat = app_state
        .chat
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("Chat provider failed".to_string()))?;

    let text = chat
        .reply(&req.messages, &req.user_message)
        .await
        .map_err(|e| {
            error!("Chat provider error: {:?}", e);
            ApiError::Upstream("Chat provider failed".to_string())
        })?;

    Ok(Json(ChatResponse { text }))
}

/// Current conditions with the outbreak-risk advisory.
///
/// Falls back to a simulated reading when the provider is missing or failing.
#[utoipa::path(
    get,
    path = "/api/weather",
    params(("city" = Option<String>, Query, description = "City name; defaults to the configured city.")),
    responses(
        (status = 200, description = "Live or simulated weather", body = WeatherResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn weather_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Json<WeatherResponse> {
    let city = query
        .city
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| app_state.config.weather_city.clone());

    let (reading, reason) = match &app_state.weather {
        None => (WeatherReading::simulated(), Some("API Key Missing".to_string())),
        Some(service) => match service.current(&city).await {
            Ok(reading) => (reading, None),
            Err(e) => {
                warn!(%city, error = %e, "weather provider failed; using simulated data");
                (WeatherReading::simulated(), Some("Offline Mode".to_string()))
            }
        },
    };

    let advisory = weather::assess_risk(&reading);
    Json(WeatherResponse {
        reading,
        simulated: reason.is_some(),
        reason,
        advisory,
        hotspots: weather::outbreak_hotspots(),
    })
}

/// Static treatment notes for a classifier label.
#[utoipa::path(
    get,
    path = "/api/treatments/{label}",
    params(
        ("label" = String, Path, description = "Classifier label, e.g. Soybean___rust"),
        ("lang" = Option<String>, Query, description = "en, mr, or hi")
    ),
    responses(
        (status = 200, description = "Treatment notes"),
        (status = 400, description = "Unsupported language")
    )
)]
pub async fn treatment_handler(
    Path(label): Path<String>,
    Query(query): Query<TreatmentQuery>,
) -> ApiResult<Json<TreatmentInfo>> {
    let lang = match query.lang.as_deref() {
        None => TreatmentLang::En,
        Some(raw) => TreatmentLang::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("Unsupported language: {}", raw)))?,
    };
    Ok(Json(treatments::lookup_or_generic(&label, lang)))
}

/// Narrate advisory text as speech.
///
/// A newer narration from the same user cancels this one.
#[utoipa::path(
    post,
    path = "/api/narrate",
    request_body = NarrateRequest,
    responses(
        (status = 200, description = "MP3 audio", body = [u8], content_type = "audio/mpeg"),
        (status = 400, description = "Nothing speakable in the text"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Superseded by a newer narration")
    )
)]
pub async fn narrate_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<NarrateRequest>,
) -> ApiResult<impl IntoResponse> {
    let text = clean_for_speech(&req.text);
    if text.is_empty() {
        return Err(ApiError::Validation("Nothing to narrate".to_string()));
    }
    let tts = app_state.tts.as_ref().ok_or_else(|| {
        ApiError::Port(PortError::Unavailable(
            "Speech provider is not configured".to_string(),
        ))
    })?;

    let ticket = app_state.narrations.begin(claims.sub);
    let outcome = tokio::select! {
        _ = ticket.token.cancelled() => {
            Err(ApiError::Superseded("Narration superseded".to_string()))
        }
        audio = tts.generate_audio(&text) => audio.map_err(|e| {
            error!("Speech provider error: {:?}", e);
            ApiError::Upstream("Speech provider failed".to_string())
        }),
    };
    drop(ticket);

    let audio = outcome?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
