//! # Error Types — Structured Error Hierarchy
//!
//! Errors raised by the foundational layer. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum DcardError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The value is not a well-formed card.
    #[error("card error: {0}")]
    Card(#[from] CardError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A value violates the card document shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// Cards must be JSON objects at the top level.
    #[error("card must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A fingerprint string does not have the `sha256-<base64url>` form.
    #[error("malformed fingerprint {value:?}: {reason}")]
    MalformedFingerprint {
        /// The rejected text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The `sig` field is present but is not a signature object.
    #[error("malformed signature block: {0}")]
    MalformedSignature(String),
}
