use thiserror::Error;

use crate::auth::AuthError;

/// Failures of an authenticated data call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token precondition failed before the call could be made.
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{operation} failed: {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("Connection error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(err) => err.status(),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}
