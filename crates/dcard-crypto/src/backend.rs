//! # Signature Backend
//!
//! The capability interface through which the verifier and the signing
//! tooling reach the Ed25519 primitive. The verifier holds an
//! `Arc<dyn SignatureBackend>`, so the primitive can be swapped without
//! touching verification logic.

use dcard_core::ContentDigest;

use crate::ed25519::{self, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Sign and verify content digests.
pub trait SignatureBackend: Send + Sync {
    /// Algorithm identifier written to `sig.alg`.
    fn algorithm(&self) -> &'static str;

    /// Sign a digest with the given key pair.
    fn sign(&self, message: &ContentDigest, key: &Ed25519KeyPair) -> Ed25519Signature;

    /// Verify a signature over a digest.
    ///
    /// Returns `Err(CryptoError::VerificationFailed)` on a mismatch and
    /// `Err(CryptoError::InvalidPublicKey)` when the key is not a valid
    /// curve point.
    fn verify(
        &self,
        signature: &Ed25519Signature,
        message: &ContentDigest,
        key: &Ed25519PublicKey,
    ) -> Result<(), CryptoError>;
}

/// `ed25519-dalek` implementation of [`SignatureBackend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DalekBackend;

impl SignatureBackend for DalekBackend {
    fn algorithm(&self) -> &'static str {
        "Ed25519"
    }

    fn sign(&self, message: &ContentDigest, key: &Ed25519KeyPair) -> Ed25519Signature {
        key.sign(message)
    }

    fn verify(
        &self,
        signature: &Ed25519Signature,
        message: &ContentDigest,
        key: &Ed25519PublicKey,
    ) -> Result<(), CryptoError> {
        ed25519::verify(message, signature, key)
    }
}
