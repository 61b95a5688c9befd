use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use capsule_core::app::BuildError;
use capsule_core::domain::{CapsuleError, ErrorKind};

/// Errors that can occur while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The service refused its wiring.
    #[error("service build error: {0}")]
    Build(#[from] BuildError),
}

impl From<toml::de::Error> for ServerError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

/// Errors surfaced by a request handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Capsule(#[from] CapsuleError),

    /// Body or query string that could not be decoded at all.
    #[error("{0}")]
    BadRequest(String),

    /// Path id that is not a capsule id.
    #[error("capsule not found: {0}")]
    UnknownId(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Capsule(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownId(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        error_response(status, self.to_string())
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
