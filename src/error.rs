//! API Error Translation
//! Mission: One typed error for every handler, one place that turns it into HTTP

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

/// Stable classification of every failure a handler can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredentials,
    EmailAlreadyExists,
    MissingToken,
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    ServiceUnavailable,
    Upstream,
    ServerError,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::EmailAlreadyExists => StatusCode::CONFLICT,
            ErrorKind::MissingToken => StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::EmailAlreadyExists => "email_already_exists",
            ErrorKind::MissingToken => "missing_token",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Upstream => "upstream_error",
            ErrorKind::ServerError => "server_error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already in use")]
    EmailAlreadyExists,
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("upstream failure: {0:#}")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidCredentials => ErrorKind::InvalidCredentials,
            ApiError::EmailAlreadyExists => ErrorKind::EmailAlreadyExists,
            ApiError::MissingToken => ErrorKind::MissingToken,
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::Forbidden => ErrorKind::Forbidden,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::NotConfigured(_) => ErrorKind::ServiceUnavailable,
            ApiError::Upstream(_) => ErrorKind::Upstream,
            ApiError::Internal(_) => ErrorKind::ServerError,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

/// Body rejections become a 400 with a fixed message; parser output is only
/// logged.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::bad_request("Request body must be a JSON object with the expected fields")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Internals stay in the server log
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = ?e, "Internal error while handling request");
                "Internal server error".to_string()
            }
            ApiError::Upstream(e) => {
                error!(error = ?e, "Upstream provider failure");
                "Upstream service failure".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": kind.as_str(),
            "message": message,
        });

        (kind.status(), Json(body)).into_response()
    }
}
