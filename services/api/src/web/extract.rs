//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections answer with the API's JSON error body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json`, except a bad body becomes a 400 `{message}` instead of axum's
/// plain-text 415/422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
