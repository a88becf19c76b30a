//! API error taxonomy and its HTTP mapping.
//!
//! Every error body is `{"detail": "..."}`, the shape existing clients
//! of the transcription endpoint already parse.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use murmur_engine::EngineError;
use serde_json::json;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request validation failure.
    #[error("{0}")]
    BadRequest(String),

    /// A server-side filename that does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Upload larger than the configured bound.
    #[error("uploaded file exceeds the maximum of {0} bytes")]
    PayloadTooLarge(usize),

    /// Failure while reading the multipart body.
    #[error("error reading upload: {0}")]
    Upload(String),

    /// Failure in the engine or the inference sidecar behind it.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Filesystem failure reading a server-side file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Engine(engine) => match engine {
                // The client sent audio we cannot decode.
                EngineError::AudioDecode(_) => StatusCode::BAD_REQUEST,
                EngineError::UnsupportedModel(_) => StatusCode::BAD_REQUEST,
                // The sidecar or model store is unhealthy, not the client.
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
