//! # Cryptographic Error Types
//!
//! Structured errors for key handling, signing, and the trust registry.

use thiserror::Error;

/// Errors from cryptographic operations in dcard.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Invalid Ed25519 public key.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid Ed25519 signing key material.
    #[error("invalid Ed25519 signing key: {0}")]
    InvalidSigningKey(String),

    /// Base64url decoding error.
    #[error("base64url decode error: {0}")]
    Base64Decode(String),

    /// The trust registry could not be loaded.
    #[error("trust registry error: {0}")]
    Registry(String),

    /// No signing key is available from the configured source.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// Card content could not be canonicalized for signing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] dcard_core::CanonicalizationError),

    /// I/O error (key and registry files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
