//! services/api/src/adapters/classifier.rs
//!
//! This module contains the adapter for the remote image classifier.
//! It implements the `DiagnosisService` port from the `core` crate.

use agrivision_core::domain::Diagnosis;
use agrivision_core::ports::{DiagnosisService, PortError, PortResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::error;

/// The one message callers see, whatever went wrong.
pub const CONNECT_FAILURE: &str = "Failed to connect to the diagnosis service.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Posts the uploaded image as multipart form data to the classifier endpoint.
#[derive(Clone)]
pub struct HttpClassifierAdapter {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpClassifierAdapter {
    /// Creates a new `HttpClassifierAdapter`.
    pub fn new(http: reqwest::Client, endpoint: String) -> Self {
        Self { http, endpoint }
    }

    async fn post_image(
        &self,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<Diagnosis, reqwest::Error> {
        let form = Form::new().part("file", Part::bytes(image).file_name(file_name.to_string()));
        self.http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<Diagnosis>()
            .await
    }
}

//=========================================================================================
// `DiagnosisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DiagnosisService for HttpClassifierAdapter {
    /// Single request, no retry.
    async fn diagnose(&self, file_name: &str, image: Vec<u8>) -> PortResult<Diagnosis> {
        self.post_image(file_name, image).await.map_err(|e| {
            error!("Classifier request failed: {:?}", e);
            PortError::Unexpected(CONNECT_FAILURE.to_string())
        })
    }
}
