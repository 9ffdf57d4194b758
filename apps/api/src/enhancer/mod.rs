//! Enhancer client — the single point of entry for all enhancement-service
//! calls in CV Maker.
//!
//! ARCHITECTURAL RULE: no other module may talk to the enhancement service
//! directly. The session controller goes through the typed [`upload`] and
//! [`revise`] operations; the ingress proxy goes through the raw
//! [`forward_revision`] passthrough.
//!
//! [`upload`]: EnhancementBackend::upload
//! [`revise`]: EnhancementBackend::revise
//! [`forward_revision`]: EnhancerClient::forward_revision

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::session::SourceFile;

const UPLOAD_PATH: &str = "/upload";
const REVISE_PATH: &str = "/upl_chat";
/// Multipart field names the enhancement service expects.
const FILE_FIELD: &str = "file";
const PROMPT_FIELD: &str = "prompt";
/// Enhancement runs an LLM pass server-side; allow it time to finish.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum EnhancerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("Enhancement service returned an empty document")]
    EmptyBody,
}

/// Error body the enhancement service returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

/// The revision operations the session controller depends on.
/// Seam for tests: the controller holds an `Arc<dyn EnhancementBackend>`.
#[async_trait]
pub trait EnhancementBackend: Send + Sync {
    async fn upload(&self, file: &SourceFile) -> Result<Bytes, EnhancerError>;
    async fn revise(&self, file: &SourceFile, instruction: &str) -> Result<Bytes, EnhancerError>;
}

/// Reqwest-backed client for the enhancement service.
#[derive(Clone)]
pub struct EnhancerClient {
    client: Client,
    base_url: String,
}

impl EnhancerClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }

    /// Forwards an already-encoded multipart body to the revision endpoint
    /// without touching it. Used by the ingress proxy; the multipart boundary
    /// lives in the caller's Content-Type header, so that header travels along.
    pub async fn forward_revision(
        &self,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, REVISE_PATH))
            .body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        request.send().await
    }

    async fn post_multipart(&self, path: &str, form: Form) -> Result<Bytes, EnhancerError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnhancerError::Service {
                status: status.as_u16(),
                message: extract_error_message(status.as_u16(), &body),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(EnhancerError::EmptyBody);
        }

        debug!("Enhancement service returned {} bytes from {path}", bytes.len());

        Ok(bytes)
    }

    fn pdf_part(file: &SourceFile) -> Result<Part, EnhancerError> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.file_name().to_owned())
            .mime_str(file.media_type())?;
        Ok(part)
    }
}

#[async_trait]
impl EnhancementBackend for EnhancerClient {
    async fn upload(&self, file: &SourceFile) -> Result<Bytes, EnhancerError> {
        let form = Form::new().part(FILE_FIELD, Self::pdf_part(file)?);
        self.post_multipart(UPLOAD_PATH, form).await
    }

    async fn revise(&self, file: &SourceFile, instruction: &str) -> Result<Bytes, EnhancerError> {
        let form = Form::new()
            .part(FILE_FIELD, Self::pdf_part(file)?)
            .text(PROMPT_FIELD, instruction.to_owned());
        self.post_multipart(REVISE_PATH, form).await
    }
}

/// Pulls the `error` field out of a service failure body, falling back to a
/// generic status-bearing phrase when the body carries no usable message.
fn extract_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ServiceError>(body)
        .ok()
        .map(|e| e.error)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| format!("Enhancement request failed with status {status}"))
}
