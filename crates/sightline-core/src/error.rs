//! Error types for sightline.

use thiserror::Error;

/// Result type alias using sightline's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sightline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input (unknown enum value, contradictory filter
    /// combination). Surfaced as a rejected request; never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested output field path matches neither the static field table
    /// nor a recognized dynamic pattern. Surfaced as a rejected request
    /// because it indicates a client/schema mismatch.
    #[error("Field not mapped: {0}")]
    FieldNotMapped(String),

    /// An external collaborator (geometry cache, user directory) is
    /// unavailable. Retryable.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// A filter build was aborted by the caller before completion.
    /// Retryable; no partially populated filter is ever returned.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Whether retrying the same request may succeed without changes.
    ///
    /// Validation and field-mapping failures are caller errors and never
    /// retryable; upstream outages and cancellations are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Upstream(_) | Error::Cancelled(_))
    }
}
