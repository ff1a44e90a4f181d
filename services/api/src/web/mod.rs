pub mod auth;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod token;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use auth::{login_handler, logout_handler, me_handler, register_handler};
use rest::{
    advisory_handler, chat_handler, diagnose_handler, narrate_handler, treatment_handler,
    weather_handler,
};
use state::AppState;

pub use middleware::{require_auth, route_gate};

/// Upload cap for leaf photos.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Not found" })),
    )
}

/// Builds the full application router. Every request, including static pages,
/// passes the route gate first.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/treatments/{label}", get(treatment_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/diagnose", post(diagnose_handler))
        .route("/api/advisory", post(advisory_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/narrate", post(narrate_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let router = Router::new().merge(public_routes).merge(protected_routes);

    // Pages come from the prebuilt frontend bundle when one is configured.
    let router = match &app_state.config.static_dir {
        Some(dir) => {
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => router.fallback(not_found),
    };

    router
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            route_gate,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
