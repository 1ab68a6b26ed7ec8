//! # Fingerprint Engine
//!
//! A fingerprint is the content address of a card:
//!
//! 1. Copy the card and drop the top-level `fingerprint` and `sig` fields.
//! 2. Canonicalize and serialize the copy (`CanonicalBytes`).
//! 3. SHA-256 the UTF-8 bytes (`ContentDigest`).
//! 4. Encode the digest as unpadded base64url and prefix it with `sha256-`.
//!
//! The digest (not the text form) is what issuers sign, so computation
//! returns both.
//!
//! Verification compares the declared and recomputed fingerprint strings
//! for exact equality. There is no partial matching.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::canonical::CanonicalBytes;
use crate::card::Card;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::{CanonicalizationError, CardError};

/// Prefix of every fingerprint string.
pub const FINGERPRINT_PREFIX: &str = "sha256-";

/// Length of an unpadded base64url SHA-256 digest.
const ENCODED_DIGEST_LEN: usize = 43;

/// A validated `sha256-<base64url>` fingerprint.
///
/// Only characters from the URL-safe base64 alphabet can appear after the
/// prefix, so a fingerprint is always safe to use as a file name or URL path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build the fingerprint for a digest.
    pub fn from_digest(digest: &ContentDigest) -> Self {
        Self(format!("{FINGERPRINT_PREFIX}{}", digest.to_base64url()))
    }

    /// Parse and validate a fingerprint string.
    pub fn parse(s: &str) -> Result<Self, CardError> {
        let malformed = |reason: &str| CardError::MalformedFingerprint {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let encoded = s
            .strip_prefix(FINGERPRINT_PREFIX)
            .ok_or_else(|| malformed("missing sha256- prefix"))?;
        if encoded.len() != ENCODED_DIGEST_LEN {
            return Err(malformed(&format!(
                "expected {ENCODED_DIGEST_LEN} base64url characters, got {}",
                encoded.len()
            )));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| malformed(&e.to_string()))?;
        if bytes.len() != 32 {
            return Err(malformed("digest is not 32 bytes"));
        }
        Ok(Self(s.to_string()))
    }

    /// The fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the digest this fingerprint encodes.
    pub fn digest(&self) -> Option<ContentDigest> {
        let encoded = self.0.strip_prefix(FINGERPRINT_PREFIX)?;
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(ContentDigest::from_bytes(arr))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A freshly computed fingerprint and the digest behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedFingerprint {
    /// `sha256-<base64url>` text form.
    pub fingerprint: Fingerprint,
    /// Raw digest bytes; the message that gets signed.
    pub digest: ContentDigest,
}

/// Outcome of checking a card's declared fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintCheck {
    /// Declared and recomputed fingerprints are identical.
    pub ok: bool,
    /// The recomputed fingerprint. `None` when the card declares none.
    pub computed: Option<Fingerprint>,
    /// The recomputed digest. `None` when the card declares no fingerprint.
    pub digest: Option<ContentDigest>,
}

/// Compute a card's fingerprint, ignoring its own `fingerprint` and `sig`.
pub fn compute_fingerprint(card: &Card) -> Result<ComputedFingerprint, CanonicalizationError> {
    let canonical = CanonicalBytes::from_value(&card.hashable_content())?;
    let digest = sha256_digest(&canonical);
    Ok(ComputedFingerprint {
        fingerprint: Fingerprint::from_digest(&digest),
        digest,
    })
}

/// Recompute a card's fingerprint and compare it with the declared one.
///
/// A card without a fingerprint yields `ok = false` and no computed value.
/// A declared fingerprint that is not a string never matches.
pub fn verify_fingerprint(card: &Card) -> Result<FingerprintCheck, CanonicalizationError> {
    let Some(declared) = card.declared_fingerprint() else {
        return Ok(FingerprintCheck {
            ok: false,
            computed: None,
            digest: None,
        });
    };
    let computed = compute_fingerprint(card)?;
    let ok = match declared {
        Value::String(s) => bool::from(
            s.as_bytes()
                .ct_eq(computed.fingerprint.as_str().as_bytes()),
        ),
        _ => false,
    };
    Ok(FingerprintCheck {
        ok,
        computed: Some(computed.fingerprint),
        digest: Some(computed.digest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(value: Value) -> Card {
        Card::from_value(value).unwrap()
    }

    #[test]
    fn empty_card_has_known_fingerprint() {
        let fp = compute_fingerprint(&card(json!({}))).unwrap();
        assert_eq!(
            fp.fingerprint.as_str(),
            "sha256-RBNvo1WzZ4oRRq0W9-hknpT7T8If536DEMBg9hyq_4o"
        );
    }

    #[test]
    fn fingerprint_ignores_protocol_fields() {
        let plain = card(json!({"name": "Ada", "level": 3}));
        let decorated = card(json!({
            "level": 3,
            "fingerprint": "sha256-whatever",
            "name": "Ada",
            "sig": {"alg": "Ed25519", "keyId": "k", "signature": "xx"}
        }));
        assert_eq!(
            compute_fingerprint(&plain).unwrap(),
            compute_fingerprint(&decorated).unwrap()
        );
    }

    #[test]
    fn nested_protocol_fields_are_hashed() {
        let a = card(json!({"inner": {"sig": "a"}}));
        let b = card(json!({"inner": {"sig": "b"}}));
        assert_ne!(
            compute_fingerprint(&a).unwrap().fingerprint,
            compute_fingerprint(&b).unwrap().fingerprint
        );
    }

    #[test]
    fn version_field_is_hashed() {
        let a = card(json!({"version": 1, "name": "x"}));
        let b = card(json!({"version": 2, "name": "x"}));
        assert_ne!(
            compute_fingerprint(&a).unwrap().fingerprint,
            compute_fingerprint(&b).unwrap().fingerprint
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let c = card(json!({"b": [1, 2, {"z": null}], "a": "text"}));
        let first = compute_fingerprint(&c).unwrap();
        for _ in 0..5 {
            assert_eq!(compute_fingerprint(&c).unwrap(), first);
        }
    }

    #[test]
    fn digest_matches_fingerprint_text() {
        let computed = compute_fingerprint(&card(json!({"x": 1}))).unwrap();
        assert_eq!(computed.fingerprint.digest(), Some(computed.digest));
    }

    #[test]
    fn verify_without_fingerprint_is_not_ok() {
        let check = verify_fingerprint(&card(json!({"name": "x"}))).unwrap();
        assert!(!check.ok);
        assert!(check.computed.is_none());
        assert!(check.digest.is_none());
    }

    #[test]
    fn verify_roundtrip_then_tamper() {
        let mut c = card(json!({"name": "Ada", "stats": {"hp": 10}}));
        let computed = compute_fingerprint(&c).unwrap();
        c.set_fingerprint(&computed.fingerprint);

        let check = verify_fingerprint(&c).unwrap();
        assert!(check.ok);
        assert_eq!(check.computed, Some(computed.fingerprint.clone()));

        c.insert("stats", json!({"hp": 11}));
        let check = verify_fingerprint(&c).unwrap();
        assert!(!check.ok);
        assert_ne!(check.computed, Some(computed.fingerprint));
    }

    #[test]
    fn non_string_fingerprint_never_matches() {
        let check = verify_fingerprint(&card(json!({"fingerprint": 12}))).unwrap();
        assert!(!check.ok);
        assert!(check.computed.is_some());
    }

    #[test]
    fn parse_accepts_computed_fingerprints() {
        let computed = compute_fingerprint(&card(json!({"k": "v"}))).unwrap();
        let parsed = Fingerprint::parse(computed.fingerprint.as_str()).unwrap();
        assert_eq!(parsed, computed.fingerprint);
    }

    #[test]
    fn parse_rejects_malformed_fingerprints() {
        assert!(Fingerprint::parse("md5-abc").is_err());
        assert!(Fingerprint::parse("sha256-abc").is_err());
        assert!(Fingerprint::parse(&format!("sha256-{}", "!".repeat(43))).is_err());
        assert!(Fingerprint::parse(&format!("sha256-{}=", "A".repeat(42))).is_err());
    }

    #[test]
    fn serde_uses_plain_string() {
        let computed = compute_fingerprint(&card(json!({}))).unwrap();
        let json = serde_json::to_string(&computed.fingerprint).unwrap();
        assert_eq!(json, format!("\"{}\"", computed.fingerprint));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, computed.fingerprint);
        assert!(serde_json::from_str::<Fingerprint>("\"sha256-short\"").is_err());
    }
}
