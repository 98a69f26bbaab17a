use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_sdk::{ErrorKind, SdkError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP status for an error class.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidState | ErrorKind::DuplicateEvent => StatusCode::CONFLICT,
        ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::DownstreamFailure => StatusCode::BAD_GATEWAY,
    }
}

/// An [`SdkError`] rendered as `{"error": {"kind", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub SdkError);

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self(SdkError::InvalidRequest(message.into()))
    }
}

impl From<SdkError> for ApiError {
    fn from(err: SdkError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!(%kind, error = %self.0, "request failed");
        } else {
            warn!(%kind, error = %self.0, "request rejected");
        }
        let body = json!({
            "error": {
                "kind": kind,
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
