use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::{AvatarError, ConversionError, NegotiationError};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::InvalidId(e) => Self::bad_request(e.to_string()),
            AvatarError::Negotiation(e @ NegotiationError::UnsupportedFormat(_)) => {
                Self::new(StatusCode::PAYMENT_REQUIRED, e.to_string())
            }
            AvatarError::Conversion(ConversionError::UnsupportedMediaType) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported media type",
            ),
            AvatarError::Conversion(e @ ConversionError::EngineFailure(_)) => {
                tracing::error!("Avatar conversion failed: {}", e);
                Self::internal("avatar conversion failed")
            }
            AvatarError::Unauthorized(e) => {
                tracing::warn!("Rejected write: {}", e);
                Self::unauthorized("unauthorized")
            }
            AvatarError::Storage(e) => {
                tracing::error!("Avatar storage failed: {}", e);
                Self::internal(e.to_string())
            }
            AvatarError::Internal(message) => {
                tracing::error!("Avatar operation failed: {}", message);
                Self::internal("avatar operation failed")
            }
        }
    }
}
