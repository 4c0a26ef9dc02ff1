//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl DomainError {
    /// Get an error code string for client-facing responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreError(_) => "STORE_ERROR",
            Self::CorruptRecord { .. } => "CORRUPT_RECORD",
        }
    }

    /// Check if this came from the backing store
    pub fn is_store(&self) -> bool {
        matches!(self, Self::StoreError(_) | Self::CorruptRecord { .. })
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreError(err.to_string())
    }
}
