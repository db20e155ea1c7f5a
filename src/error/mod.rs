//! Error types for the Livly integration.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::{AuthError, LoginError, StoreError};

/// Primary error type for setup, polling and login.
#[derive(Error, Debug)]
pub enum LivlyError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Login(#[from] LoginError),

    /// A fetch cycle failed; the polling framework keeps the stale result.
    #[error("Update failed: {message}")]
    UpdateFailed {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Broad error category for deciding what the user should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials are missing or rejected; log in again.
    Authentication,
    /// Backend or transport trouble; a later poll may succeed.
    Transient,
    /// Local storage or configuration problem.
    Local,
}

impl LivlyError {
    /// Fetch failure wrapping the client error that caused it.
    pub fn update_failed(source: ApiError) -> Self {
        let message = match &source {
            ApiError::Auth(err) => format!("Authentication error: {err}"),
            other => format!("API error: {other}"),
        };
        Self::UpdateFailed { message, source }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(AuthError::Network(_)) => ErrorCategory::Transient,
            Self::Auth(_) | Self::Login(_) => ErrorCategory::Authentication,
            Self::Api(source) | Self::UpdateFailed { source, .. } => api_category(source),
            Self::Store(StoreError::NotConfigured) => ErrorCategory::Authentication,
            Self::Store(_) | Self::Configuration(_) => ErrorCategory::Local,
        }
    }
}

fn api_category(err: &ApiError) -> ErrorCategory {
    match err {
        ApiError::Auth(AuthError::Network(_)) => ErrorCategory::Transient,
        ApiError::Auth(_) | ApiError::Status { status: 401 | 403, .. } => {
            ErrorCategory::Authentication
        }
        _ => ErrorCategory::Transient,
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LivlyError>;
