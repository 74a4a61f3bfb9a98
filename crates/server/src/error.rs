use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur when running the Wicket server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request is malformed (e.g. the blob id is not a valid digest).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failed (missing, invalid, expired, or out-of-scope credentials).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authorized but the blob does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The blob store failed.
    #[error("blob store error: {0}")]
    Blob(#[from] wicket_blob::BlobError),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] wicket_token::TokenError),

    /// A request-shape error whose status is chosen by configuration.
    #[error("{message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Human-readable message.
        message: String,
    },
}

impl ServerError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Status { status, .. } => *status,
            Self::Config(_) | Self::Io(_) | Self::Blob(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Status { message, .. } => message.clone(),
            Self::Config(_) | Self::Io(_) | Self::Blob(_) | Self::Token(_) => {
                tracing::warn!(error = %self, "request failed");
                "internal server error".to_owned()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
