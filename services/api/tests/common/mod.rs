//! Shared helpers for the API integration tests: a router wired to the
//! in-memory user store and scripted provider fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agrivision_core::advisory::{AdvisoryClient, AdvisoryPolicy};
use agrivision_core::domain::{ChatTurn, Diagnosis};
use agrivision_core::ports::{
    ChatService, DiagnosisService, PortError, PortResult, TextGenerationService,
    TextToSpeechService, WeatherService,
};
use agrivision_core::weather::WeatherReading;
use api_lib::adapters::InMemoryUserStore;
use api_lib::config::Config;
use api_lib::web::build_router;
use api_lib::web::state::{AppState, NarrationRegistry};
use api_lib::web::token::TokenSigner;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Notify;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

// ---------------------------------------------------------------------------
// Provider fakes
// ---------------------------------------------------------------------------

/// Returns a fixed verdict, or fails like an unreachable endpoint.
pub struct FakeClassifier {
    pub verdict: Option<Diagnosis>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl DiagnosisService for FakeClassifier {
    async fn diagnose(&self, _file_name: &str, image: Vec<u8>) -> PortResult<Diagnosis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!image.is_empty());
        self.verdict
            .clone()
            .ok_or_else(|| PortError::Unexpected("connection refused".to_string()))
    }
}

#[derive(Clone, Copy)]
pub enum Reply {
    Busy,
    Broken,
    Text(&'static str),
}

/// Answers per model from a script and records the order of calls.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub replies: HashMap<String, Reply>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[(&str, Reply)]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|(m, r)| (m.to_string(), *r)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn called_models(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationService for ScriptedGenerator {
    async fn generate(&self, model: &str, _prompt: &str) -> PortResult<String> {
        self.calls.lock().unwrap().push(model.to_string());
        match self.replies.get(model).copied().unwrap_or(Reply::Broken) {
            Reply::Busy => Err(PortError::Unavailable("503 Service Unavailable".to_string())),
            Reply::Broken => Err(PortError::Unexpected("400 Bad Request".to_string())),
            Reply::Text(text) => Ok(text.to_string()),
        }
    }
}

pub struct EchoChat;

#[async_trait]
impl ChatService for EchoChat {
    async fn reply(&self, history: &[ChatTurn], user_message: &str) -> PortResult<String> {
        Ok(format!("{} turns before: {}", history.len(), user_message))
    }
}

pub struct FixedWeather(pub Option<WeatherReading>);

#[async_trait]
impl WeatherService for FixedWeather {
    async fn current(&self, _city: &str) -> PortResult<WeatherReading> {
        self.0
            .clone()
            .ok_or_else(|| PortError::Unexpected("city not found".to_string()))
    }
}

/// The first call hangs until cancelled; later calls answer at once.
#[derive(Default)]
pub struct StallingTts {
    pub calls: AtomicUsize,
    pub first_started: Notify,
    pub spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl TextToSpeechService for StallingTts {
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.first_started.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(b"ID3-fake-mp3".to_vec())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "CLASSIFIER_URL" => Some("http://classifier.test/predict".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Everything the tests may want to inspect after driving the router.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserStore>,
    pub classifier: Arc<FakeClassifier>,
    pub generator: Arc<ScriptedGenerator>,
    pub tts: Arc<StallingTts>,
    pub narrations: Arc<NarrationRegistry>,
    pub tokens: TokenSigner,
}

pub struct TestAppBuilder {
    verdict: Option<Diagnosis>,
    generator: Arc<ScriptedGenerator>,
    models: Vec<String>,
    max_fallbacks: usize,
    weather: Option<Arc<dyn WeatherService>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            verdict: Some(Diagnosis {
                disease: "Soybean___rust".to_string(),
                confidence: 92.4,
                status: "success".to_string(),
            }),
            generator: ScriptedGenerator::new(&[("primary", Reply::Text("advisory text"))]),
            models: vec!["primary".to_string(), "secondary".to_string()],
            max_fallbacks: 1,
            weather: None,
        }
    }
}

impl TestAppBuilder {
    pub fn classifier_down(mut self) -> Self {
        self.verdict = None;
        self
    }

    pub fn generator(mut self, generator: Arc<ScriptedGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn advisory_models(mut self, models: &[&str], max_fallbacks: usize) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self.max_fallbacks = max_fallbacks;
        self
    }

    pub fn weather(mut self, weather: FixedWeather) -> Self {
        self.weather = Some(Arc::new(weather));
        self
    }

    pub fn build(self) -> TestApp {
        let config = test_config();
        let tokens = TokenSigner::new(&config.jwt_secret);
        let users = Arc::new(InMemoryUserStore::new());
        let classifier = Arc::new(FakeClassifier {
            verdict: self.verdict,
            calls: AtomicUsize::new(0),
        });
        let tts = Arc::new(StallingTts::default());
        let narrations = Arc::new(NarrationRegistry::new());
        let policy = AdvisoryPolicy::new(self.models, self.max_fallbacks).expect("policy");

        let state = Arc::new(AppState {
            users: users.clone(),
            config: Arc::new(config),
            tokens: tokens.clone(),
            classifier: classifier.clone(),
            advisory: Some(AdvisoryClient::new(self.generator.clone(), policy)),
            chat: Some(Arc::new(EchoChat) as Arc<dyn ChatService>),
            weather: self.weather,
            tts: Some(tts.clone() as Arc<dyn TextToSpeechService>),
            narrations: narrations.clone(),
        });

        TestApp {
            router: build_router(state),
            users,
            classifier,
            generator: self.generator,
            tts,
            narrations,
            tokens,
        }
    }
}

pub fn build_test_app() -> TestApp {
    TestAppBuilder::default().build()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// `token=<jwt>` from a login response's `Set-Cookie`.
pub fn session_cookie_pair(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().trim().to_string()
}

/// Registers a user and logs in, returning the cookie pair to send back.
pub async fn register_and_login(app: &Router, email: &str, password: &str) -> String {
    let response = post_json(
        app,
        "/api/auth/register",
        serde_json::json!({ "name": "Asha Patil", "email": email, "password": password }),
        None,
    )
    .await;
    assert_eq!(response.status(), 201);

    let response = post_json(
        app,
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    session_cookie_pair(&response)
}

/// A multipart body with a single `file` part.
pub fn multipart_upload(uri: &str, cookie: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "agrivision-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"leaf.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}
