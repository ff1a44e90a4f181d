//! services/api/src/web/middleware.rs
//!
//! The page route gate and the session guard for protected API routes. Both only
//! read the cookie and verify the token; neither touches the user store.

use agrivision_core::route_gate::{self, GateDecision, CALLBACK_PARAM, HOME_PATH, LOGIN_PATH};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Url;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::token::{token_from_cookie_header, Claims, TokenSigner};

fn session_claims(headers: &HeaderMap, tokens: &TokenSigner) -> Option<Claims> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let token = token_from_cookie_header(cookie_header)?;
    tokens.verify(token).ok()
}

/// Builds `path?k=v&...` with every value form-encoded.
pub fn path_with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let Ok(mut url) = Url::parse("http://gate.invalid") else {
        return path.to_string();
    };
    url.set_path(path);
    url.query_pairs_mut().extend_pairs(pairs.iter().copied());
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    }
}

/// `/login?callbackUrl=<path>`.
pub fn login_redirect_target(callback: &str) -> String {
    path_with_query(LOGIN_PATH, &[(CALLBACK_PARAM, callback)])
}

/// Redirects page requests that the session state does not allow.
pub async fn route_gate(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let signed_in = session_claims(req.headers(), &state.tokens).is_some();

    match route_gate::decide(&path, signed_in) {
        GateDecision::Allow => next.run(req).await,
        GateDecision::RedirectToLogin { callback } => {
            debug!(%path, "no valid session; redirecting to login");
            Redirect::temporary(&login_redirect_target(&callback)).into_response()
        }
        GateDecision::RedirectHome => {
            debug!(%path, "already signed in; redirecting home");
            Redirect::temporary(HOME_PATH).into_response()
        }
    }
}

/// Middleware that validates the session cookie and extracts its claims.
///
/// If valid, inserts the `Claims` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = session_claims(req.headers(), &state.tokens)
        .ok_or_else(|| ApiError::Unauthenticated("Not authenticated".to_string()))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
