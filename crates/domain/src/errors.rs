//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Packtrail
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PacktrailError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("API error: {0}")]
    Api(String),

    /// The provider rejected the API key. Aborts the remaining batch.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Plan expired or query limit reached. Aborts the remaining batch.
    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Credential missing: {0}")]
    CredentialMissing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PacktrailError {
    /// True for the error classes that must abort a running batch sync
    /// instead of being recovered per parcel.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Quota(_) | Self::CredentialMissing(_))
    }
}

/// Result type alias for Packtrail operations
pub type Result<T> = std::result::Result<T, PacktrailError>;
