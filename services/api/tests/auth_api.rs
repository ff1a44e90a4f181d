mod common;

use agrivision_core::ports::UserStore;
use axum::http::{header, StatusCode};
use common::*;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn register_creates_user_and_rejects_duplicates() {
    let app = build_test_app();

    let response = post_json(
        &app.router,
        "/api/auth/register",
        json!({ "name": "Asha", "email": "asha@farm.in", "password": "kharif-2025" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "asha@farm.in");
    assert!(body["user"].get("password_hash").is_none());

    let response = post_json(
        &app.router,
        "/api/auth/register",
        json!({ "name": "Other", "email": "asha@farm.in", "password": "different" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User already exists");
    assert_eq!(app.users.len().await, 1);
}

#[tokio::test]
async fn register_requires_every_field() {
    let app = build_test_app();
    let response = post_json(
        &app.router,
        "/api/auth/register",
        json!({ "name": "Asha", "email": "asha@farm.in" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Please provide all fields");
    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn wrongly_typed_register_field_is_a_json_400() {
    let app = build_test_app();
    let response = post_json(
        &app.router,
        "/api/auth/register",
        json!({ "name": "Asha", "email": "asha@farm.in", "password": 12345 }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let message = body_json(response).await["message"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(message.contains("password"), "{message}");
    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn register_body_that_is_not_json_is_a_json_400() {
    let app = build_test_app();
    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"].is_string());
}

#[tokio::test]
async fn stored_password_is_hashed() {
    let app = build_test_app();
    register_and_login(&app.router, "ravi@farm.in", "monsoon").await;

    let creds = app
        .users
        .find_credentials_by_email("ravi@farm.in")
        .await
        .unwrap()
        .expect("stored");
    assert_ne!(creds.password_hash, "monsoon");
    assert!(creds.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = build_test_app();
    register_and_login(&app.router, "ravi@farm.in", "monsoon").await;

    let unknown = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "nobody@farm.in", "password": "monsoon" }),
        None,
    )
    .await;
    let wrong = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "ravi@farm.in", "password": "rabi" }),
        None,
    )
    .await;

    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert!(unknown.headers().get(header::SET_COOKIE).is_none());
    assert!(wrong.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(unknown).await, body_json(wrong).await);
}

#[tokio::test]
async fn login_without_password_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "ravi@farm.in" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Please provide email and password"
    );
}

#[tokio::test]
async fn login_sets_an_http_only_session_cookie() {
    let app = build_test_app();
    register_and_login(&app.router, "ravi@farm.in", "monsoon").await;

    let response = post_json(
        &app.router,
        "/api/auth/login",
        json!({ "email": "ravi@farm.in", "password": "monsoon" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=3600"));
    // Test config leaves secure cookies off.
    assert!(!set_cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "ravi@farm.in");
}

#[tokio::test]
async fn session_lookup_follows_the_cookie() {
    let app = build_test_app();
    let cookie = register_and_login(&app.router, "ravi@farm.in", "monsoon").await;

    let response = get(&app.router, "/api/auth/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["email"], "ravi@farm.in");

    let response = get(&app.router, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Not authenticated");

    let response = get(&app.router, "/api/auth/me", Some("token=not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid token");
}

#[tokio::test]
async fn session_for_a_deleted_user_is_not_found() {
    let app = build_test_app();
    let token = app.tokens.issue(Uuid::new_v4(), "ghost@farm.in").unwrap();

    let response = get(&app.router, "/api/auth/me", Some(&format!("token={token}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "User not found");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let app = build_test_app();
    let short =
        api_lib::web::token::TokenSigner::with_ttl(JWT_SECRET, chrono::Duration::seconds(1));
    let token = short.issue(Uuid::new_v4(), "ravi@farm.in").unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let response = get(&app.router, "/api/auth/me", Some(&format!("token={token}"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = build_test_app();
    let cookie = register_and_login(&app.router, "ravi@farm.in", "monsoon").await;

    let response = post_json(&app.router, "/api/auth/logout", json!({}), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}
