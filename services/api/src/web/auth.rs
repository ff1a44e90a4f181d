//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, session check, and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use agrivision_core::domain::{NewUser, User};
use agrivision_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;
use crate::web::token::{clear_session_cookie, session_cookie, token_from_cookie_header};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Every field is optional on the wire so a missing one is a 400 with a
/// readable message rather than a deserialization rejection.
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserView,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

/// Any parse or verification failure counts as a mismatch.
fn password_matches(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is unreadable: {:?}", e);
            false
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Missing fields or user already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(name), Some(email), Some(password)) =
        (present(req.name), present(req.email), present(req.password))
    else {
        return Err(ApiError::Validation("Please provide all fields".to_string()));
    };
    let email = email.trim().to_string();

    if state.users.find_credentials_by_email(&email).await?.is_some() {
        return Err(ApiError::Validation("User already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;

    // The store's uniqueness check still decides races between two registrations.
    let user = state
        .users
        .create_user(NewUser {
            name: name.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            PortError::AlreadyExists(_) => ApiError::Validation("User already exists".to_string()),
            other => ApiError::Port(other),
        })?;

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; sets the session cookie", body = AuthResponse),
        (status = 400, description = "Missing fields or invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(ApiError::Validation(
            "Please provide email and password".to_string(),
        ));
    };

    // 1. Unknown email and wrong password end in the same error.
    let credentials = state
        .users
        .find_credentials_by_email(email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password_matches(&password, &credentials.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    // 2. Sign the session token
    let user = credentials.user;
    let token = state.tokens.issue(user.id, &user.email).map_err(|e| {
        error!("Failed to sign session token: {:?}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;

    // 3. Return response with cookie
    let cookie = session_cookie(&token, state.config.secure_cookies);
    info!(user_id = %user.id, "user logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: user.into(),
        }),
    ))
}

/// GET /api/auth/me - Resolve the session cookie to a user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user", body = SessionResponse),
        (status = 401, description = "Missing, invalid, or expired session"),
        (status = 404, description = "User not found")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_cookie_header)
        .ok_or_else(|| ApiError::Unauthenticated("Not authenticated".to_string()))?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthenticated("Invalid token".to_string()))?;

    let user = state.users.get_user_by_id(claims.sub).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
        other => ApiError::Port(other),
    })?;

    Ok(Json(SessionResponse { user: user.into() }))
}

/// POST /api/auth/logout - Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Tokens are stateless; clearing the cookie is all there is to do.
    let cookie = clear_session_cookie(state.config.secure_cookies);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}
