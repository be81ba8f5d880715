//! Error types for group balancing and poll processing.

use thiserror::Error;

/// Error type for balancing and record operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing required field in a persisted record
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Validation error in constraints or record contents
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for balancing and record operations
pub type Result<T> = std::result::Result<T, Error>;
