//! # Verification Orchestrator
//!
//! Combines the fingerprint engine and the signature verifier into one
//! verdict per card:
//!
//! | Card                      | Fingerprint                       | Status       |
//! |---------------------------|-----------------------------------|--------------|
//! | no `sig`                  | computed and attached, or checked | `unsigned`   |
//! | `sig`, signature verifies | must be present and match         | `verified`   |
//! | `sig`, signature fails    | must be present and match         | `unverified` |
//!
//! A fingerprint mismatch is always an error. Signature problems are
//! reported in the verdict unless strict mode is on, in which case they are
//! errors too.

use dcard_core::{compute_fingerprint, verify_fingerprint, Card, Fingerprint};
use dcard_crypto::SignatureVerifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;

/// Verdict for an imported card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Signed by a trusted key over the card's own content.
    Verified,
    /// Signed, but the signature could not be verified.
    Unverified,
    /// No signature.
    Unsigned,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Unsigned => "unsigned",
        })
    }
}

/// Result of verifying one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// The card's validated or freshly computed fingerprint.
    pub fingerprint: Fingerprint,
    /// `status == Verified`.
    pub verified: bool,
    /// `status == Unsigned`.
    pub unsigned: bool,
    /// Why the signature was not accepted. Set only for `Unverified`.
    pub reason: Option<String>,
    /// The verdict.
    pub status: VerificationStatus,
}

impl VerificationResult {
    fn new(fingerprint: Fingerprint, status: VerificationStatus, reason: Option<String>) -> Self {
        Self {
            fingerprint,
            verified: status == VerificationStatus::Verified,
            unsigned: status == VerificationStatus::Unsigned,
            reason,
            status,
        }
    }
}

/// Produces verdicts for cards.
#[derive(Debug, Clone)]
pub struct CardVerifier {
    signatures: SignatureVerifier,
    strict: bool,
}

impl CardVerifier {
    /// A verifier. `strict` turns signature problems into errors.
    pub fn new(signatures: SignatureVerifier, strict: bool) -> Self {
        Self { signatures, strict }
    }

    /// Whether strict mode is on.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Verify a card, attaching its fingerprint when it had none.
    pub fn verify(&self, card: &mut Card) -> Result<VerificationResult, ImportError> {
        if !card.has_signature() {
            let fingerprint = if card.declared_fingerprint().is_none() {
                let computed = compute_fingerprint(card)?;
                card.set_fingerprint(&computed.fingerprint);
                computed.fingerprint
            } else {
                self.check_fingerprint(card)?.0
            };
            if self.strict {
                return Err(ImportError::SignatureRequired);
            }
            tracing::info!(fingerprint = %fingerprint, status = "unsigned", "card verdict");
            return Ok(VerificationResult::new(
                fingerprint,
                VerificationStatus::Unsigned,
                None,
            ));
        }

        if card.declared_fingerprint().is_none() {
            return Err(ImportError::MissingFingerprint);
        }
        let (fingerprint, digest) = self.check_fingerprint(card)?;

        let check = self.signatures.verify_signature(card, &digest);
        if check.ok {
            tracing::info!(
                fingerprint = %fingerprint,
                key_id = ?check.key_id,
                status = "verified",
                "card verdict"
            );
            return Ok(VerificationResult::new(
                fingerprint,
                VerificationStatus::Verified,
                None,
            ));
        }

        let reason = check.reason.unwrap_or_default();
        if self.strict {
            return Err(ImportError::SignatureInvalid(reason));
        }
        tracing::info!(
            fingerprint = %fingerprint,
            status = "unverified",
            reason = %reason,
            "card verdict"
        );
        Ok(VerificationResult::new(
            fingerprint,
            VerificationStatus::Unverified,
            Some(reason),
        ))
    }

    /// Check the declared fingerprint, returning the validated fingerprint
    /// and digest.
    fn check_fingerprint(
        &self,
        card: &Card,
    ) -> Result<(Fingerprint, dcard_core::ContentDigest), ImportError> {
        let check = verify_fingerprint(card)?;
        match (check.ok, check.computed, check.digest) {
            (true, Some(fingerprint), Some(digest)) => Ok((fingerprint, digest)),
            (_, Some(computed), _) => {
                let declared = match card.declared_fingerprint() {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                tracing::warn!(declared = %declared, computed = %computed, "fingerprint mismatch");
                Err(ImportError::FingerprintMismatch { declared, computed })
            }
            _ => Err(ImportError::MissingFingerprint),
        }
    }
}
