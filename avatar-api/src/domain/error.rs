use thiserror::Error;

use super::models::AvatarIdError;

/// The requested output cannot be produced by this deployment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("unsupported image type: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("conversion engine failed: {0}")]
    EngineFailure(String),
    /// The engine reported success but produced no output file.
    #[error("unsupported media type")]
    UnsupportedMediaType,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("write access is restricted to loopback clients, got {0}")]
    Forbidden(std::net::IpAddr),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to store original: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup capability probing failed for a format the service cannot do without.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("baseline conversion to {format} failed: {source}")]
    BaselineUnavailable {
        format: super::models::ImageFormat,
        #[source]
        source: ConversionError,
    },
    #[error("failed to prepare scratch directory: {0}")]
    ScratchDirectory(#[from] std::io::Error),
}

/// Errors surfaced by the avatar service to its callers.
#[derive(Debug, Error)]
pub enum AvatarError {
    #[error(transparent)]
    InvalidId(#[from] AvatarIdError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Internal(String),
}

impl AvatarError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
