use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::auth::{jwt::TokenError, services::AuthError};

/// Error body shared by every handler: `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { detail: detail.into() }))
}

/// Faults are logged here and reported without internal detail.
pub fn internal<E: std::fmt::Display>(e: E) -> ApiError {
    error!(error = %e, "internal error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl From<AuthError> for (StatusCode, Json<ErrorBody>) {
    fn from(err: AuthError) -> Self {
        match err {
            err if err.is_client_error() => api_error(StatusCode::BAD_REQUEST, err.to_string()),
            AuthError::Token(TokenError::InvalidToken(reason)) => {
                warn!(%reason, "token rejected");
                api_error(StatusCode::UNAUTHORIZED, "Invalid or expired token")
            }
            other => internal(other),
        }
    }
}
