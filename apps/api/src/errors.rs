use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The client-visible shape is always a flat `{"error": string}` object;
/// transport-level causes are logged but never leak to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// The enhancement service answered with a non-2xx status. The proxy
    /// mirrors that status back and wraps the service's text body.
    #[error("Backend error: {message}")]
    Upstream { status: u16, message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Upstream { status, message } => {
                tracing::warn!("Enhancement service returned {status}: {message}");
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    format!("Backend error: {message}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}
