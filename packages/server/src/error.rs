//! Error responses for the HTTP API.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use safeguard_database_models::ContactValidationError;
use safeguard_server_models::{ApiErrorBody, LocationParamError};
use safeguard_sos::SosError;
use thiserror::Error;

/// Application-level error type for API handlers.
///
/// Every variant renders as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unknown session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Server-side failure. Holds the public message only.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Logs `source` and returns an [`ApiError::Internal`] that only
    /// exposes `message`.
    pub fn internal(message: &str, source: &dyn std::fmt::Display) -> Self {
        log::error!("{message}: {source}");
        Self::Internal(message.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<LocationParamError> for ApiError {
    fn from(e: LocationParamError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<ContactValidationError> for ApiError {
    fn from(e: ContactValidationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<SosError> for ApiError {
    fn from(e: SosError) -> Self {
        match &e {
            SosError::Validation(_) | SosError::NoContacts => Self::BadRequest(e.to_string()),
            SosError::UnknownUser => Self::NotFound(e.to_string()),
            SosError::Store(source) => Self::internal("Failed to send SOS alert", source),
        }
    }
}
