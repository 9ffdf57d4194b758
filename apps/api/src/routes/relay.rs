//! Ingress relay — stateless multipart passthrough to the enhancement
//! service's revision endpoint.
//!
//! The relay never parses the multipart payload; the body and its
//! `Content-Type` header (which carries the multipart boundary) travel to
//! the service untouched. Only the response shape is normalized: binary
//! success becomes a named PDF download, failure becomes `{"error": ...}`.

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::errors::AppError;
use crate::session::{ARTIFACT_FILE_NAME, PDF_MEDIA_TYPE};
use crate::state::AppState;

/// Inbound bodies are capped at the upload limit the front end advertises.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// POST /upl_chat
pub async fn relay_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .context("Failed to read request body")?;

    let response = state
        .enhancer
        .forward_revision(content_type.as_deref(), body)
        .await
        .context("Enhancement service unreachable")?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let pdf = response
        .bytes()
        .await
        .context("Failed to read enhancement service response")?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_MEDIA_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{ARTIFACT_FILE_NAME}\""),
        )
        .body(Body::from(pdf))
        .context("Failed to build relay response")?;

    Ok(response)
}
