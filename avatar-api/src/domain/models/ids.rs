use std::fmt;

use thiserror::Error;

const MAX_AVATAR_ID_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvatarIdError {
    #[error("avatar id must not be empty")]
    Empty,
    #[error("avatar id is longer than {} bytes", MAX_AVATAR_ID_LEN)]
    TooLong,
    #[error("avatar id contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// An opaque avatar identifier.
///
/// Safe to use as a file stem: only ASCII alphanumerics and `-_.@` are
/// accepted, and a leading dot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvatarId(String);

impl AvatarId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AvatarId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for AvatarId {
    type Error = AvatarIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(AvatarIdError::Empty);
        }
        if value.len() > MAX_AVATAR_ID_LEN {
            return Err(AvatarIdError::TooLong);
        }

        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@');
        if value.starts_with('.') || !value.chars().all(allowed) {
            return Err(AvatarIdError::InvalidCharacters(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for AvatarId {
    type Error = AvatarIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
