//! # Signature Verifier
//!
//! Checks a card's `sig` block against the trust registry. Checks run in a
//! fixed order and stop at the first failure:
//!
//! 1. `sig` is present and is an object.
//! 2. `sig.alg` is `Ed25519`.
//! 3. `sig.keyId` resolves in the registry.
//! 4. `sig.signature` verifies over the card's content digest under the
//!    registry key.
//!
//! A bad signature is an expected outcome for an untrusted card, so every
//! failure, including decoding errors, is reported in [`SignatureCheck`]
//! rather than returned as an error.

use std::sync::Arc;

use dcard_core::{Card, ContentDigest};
use serde::Serialize;

use crate::backend::{DalekBackend, SignatureBackend};
use crate::ed25519::Ed25519Signature;
use crate::registry::TrustRegistry;

/// The only accepted `sig.alg` value.
pub const SUPPORTED_ALGORITHM: &str = "Ed25519";

/// Reason reported when the card has no `sig`.
pub const REASON_MISSING_SIGNATURE: &str = "Missing signature";
/// Reason reported when `sig.alg` is absent or not Ed25519.
pub const REASON_UNSUPPORTED_ALGORITHM: &str = "Unsupported signature algorithm";
/// Reason reported when `sig.keyId` is absent or not in the registry.
pub const REASON_UNKNOWN_KEY_ID: &str = "Unknown keyId";
/// Reason reported when the signature does not verify.
pub const REASON_SIGNATURE_MISMATCH: &str = "Signature mismatch";
/// Reason reported when `sig` is not an object of strings.
pub const REASON_MALFORMED_SIGNATURE: &str = "Malformed signature block";

/// Outcome of a signature check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCheck {
    /// The signature verified under a trusted key.
    pub ok: bool,
    /// Why verification failed. `None` on success.
    pub reason: Option<String>,
    /// The key id, once it has resolved in the registry.
    pub key_id: Option<String>,
}

impl SignatureCheck {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            key_id: None,
        }
    }
}

/// Verifies card signatures against a trust registry.
#[derive(Clone)]
pub struct SignatureVerifier {
    registry: Arc<TrustRegistry>,
    backend: Arc<dyn SignatureBackend>,
}

impl SignatureVerifier {
    /// A verifier using the dalek backend.
    pub fn new(registry: Arc<TrustRegistry>) -> Self {
        Self::with_backend(registry, Arc::new(DalekBackend))
    }

    /// A verifier using a caller-supplied backend.
    pub fn with_backend(registry: Arc<TrustRegistry>, backend: Arc<dyn SignatureBackend>) -> Self {
        Self { registry, backend }
    }

    /// The registry this verifier trusts.
    pub fn registry(&self) -> &TrustRegistry {
        &self.registry
    }

    /// Check `card.sig` over `digest`, the card's recomputed content digest.
    pub fn verify_signature(&self, card: &Card, digest: &ContentDigest) -> SignatureCheck {
        let block = match card.signature_block() {
            None => return SignatureCheck::rejected(REASON_MISSING_SIGNATURE),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "unparseable sig block");
                return SignatureCheck::rejected(REASON_MALFORMED_SIGNATURE);
            }
            Some(Ok(block)) => block,
        };

        if block.alg.as_deref() != Some(SUPPORTED_ALGORITHM) {
            return SignatureCheck::rejected(REASON_UNSUPPORTED_ALGORITHM);
        }

        let Some(key_id) = block.key_id else {
            return SignatureCheck::rejected(REASON_UNKNOWN_KEY_ID);
        };
        let Some(entry) = self.registry.lookup(&key_id) else {
            tracing::debug!(key_id = %key_id, "key id not in trust registry");
            return SignatureCheck::rejected(REASON_UNKNOWN_KEY_ID);
        };

        let outcome = entry.decode_public_key().and_then(|public_key| {
            let signature = Ed25519Signature::from_base64url(block.signature.as_deref().unwrap_or(""))?;
            self.backend.verify(&signature, digest, &public_key)
        });

        let reason = match outcome {
            Ok(()) => None,
            Err(crate::CryptoError::VerificationFailed(_)) => {
                Some(REASON_SIGNATURE_MISMATCH.to_string())
            }
            Err(e) => Some(e.to_string()),
        };
        SignatureCheck {
            ok: reason.is_none(),
            reason,
            key_id: Some(key_id),
        }
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("registry", &self.registry)
            .field("algorithm", &self.backend.algorithm())
            .finish()
    }
}
