//! Mobile-friendly error types.

use storm_content::{CacheError, ContentError, IdentifierError, UpdateError};

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("An update is already in progress")]
    UpdateInProgress,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for MobileError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound(name) => MobileError::NotFound(name),
            CacheError::InvalidKey(_) | CacheError::NoCachePath => {
                MobileError::InvalidInput(err.to_string())
            }
            CacheError::Io(_) => MobileError::StorageError(err.to_string()),
            CacheError::Utf8(_) | CacheError::Json(_) | CacheError::UnsupportedFormat(_) => {
                MobileError::DecodeError(err.to_string())
            }
        }
    }
}

impl From<IdentifierError> for MobileError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::Io(_) => MobileError::StorageError(err.to_string()),
            _ => MobileError::DecodeError(err.to_string()),
        }
    }
}

impl From<UpdateError> for MobileError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::InvalidState(reason) => MobileError::InvalidState(reason.to_string()),
            UpdateError::AlreadyInProgress => MobileError::UpdateInProgress,
            UpdateError::Transport(e) => MobileError::NetworkError(e.to_string()),
            UpdateError::Install(e) => MobileError::InstallFailed(e.to_string()),
        }
    }
}

impl From<ContentError> for MobileError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Cache(e) => e.into(),
            ContentError::Identifiers(e) => e.into(),
            ContentError::Fetch(e) => MobileError::InvalidInput(e.to_string()),
        }
    }
}
