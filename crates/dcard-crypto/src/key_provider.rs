//! # Key Provider Abstraction
//!
//! Abstracts where the issuer's signing key lives:
//!
//! - [`LocalKeyProvider`]: an in-memory key, for tests and `dcard keygen`
//!   output loaded from disk.
//! - [`EnvKeyProvider`]: reads a base64url 32-byte seed from an environment
//!   variable (`DCARD_PRIVKEY_BASE64URL` by default).
//!
//! [`sign_card`] is the signing tool's core: it fingerprints a card, signs
//! the digest, and writes both `fingerprint` and `sig`.

use std::path::Path;

use dcard_core::{compute_fingerprint, Card, ContentDigest, Fingerprint, SignatureBlock};

use crate::backend::{DalekBackend, SignatureBackend};
use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Environment variable holding the issuer seed for the signing tool.
pub const PRIVKEY_ENV_VAR: &str = "DCARD_PRIVKEY_BASE64URL";

/// Key id used when neither the caller nor the card names one.
pub const DEFAULT_KEY_ID: &str = "inspire-main-2025";

/// A source of Ed25519 signatures.
///
/// Implementations must be `Send + Sync` so one provider can sign from
/// multiple tasks.
pub trait KeyProvider: Send + Sync {
    /// Sign a content digest with the managed key.
    fn sign(&self, digest: &ContentDigest) -> Result<Ed25519Signature, CryptoError>;

    /// The public key matching the managed key.
    fn public_key(&self) -> Ed25519PublicKey;

    /// Human-readable name for diagnostics.
    fn provider_name(&self) -> &str;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory key provider.
pub struct LocalKeyProvider {
    key: Ed25519KeyPair,
}

impl LocalKeyProvider {
    /// Wrap an existing key pair.
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// Create from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(Ed25519KeyPair::from_seed(seed))
    }

    /// Load a base64url seed from a key file written by `dcard keygen`.
    pub fn from_file(path: &Path) -> Result<Self, CryptoError> {
        let text = zeroize::Zeroizing::new(std::fs::read_to_string(path)?);
        Ok(Self::new(Ed25519KeyPair::from_base64url(text.trim())?))
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign(&self, digest: &ContentDigest) -> Result<Ed25519Signature, CryptoError> {
        Ok(DalekBackend.sign(digest, &self.key))
    }

    fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads the signing key from an environment variable.
///
/// The variable holds the base64url encoding of the 32-byte seed. It is read
/// once at construction.
pub struct EnvKeyProvider {
    key: Ed25519KeyPair,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load from [`PRIVKEY_ENV_VAR`].
    pub fn from_default_env() -> Result<Self, CryptoError> {
        Self::from_env(PRIVKEY_ENV_VAR)
    }

    /// Load from the named environment variable.
    ///
    /// Returns `CryptoError::KeyUnavailable` when the variable is unset or
    /// empty.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let value = std::env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CryptoError::KeyUnavailable(format!("{var_name} is not set")))?;
        let value = zeroize::Zeroizing::new(value);
        let key = Ed25519KeyPair::from_base64url(&value).map_err(|e| {
            CryptoError::InvalidSigningKey(format!("{var_name}: {e}"))
        })?;
        Ok(Self {
            key,
            var_name: var_name.to_string(),
        })
    }

    /// The environment variable this provider was loaded from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, digest: &ContentDigest) -> Result<Ed25519Signature, CryptoError> {
        Ok(DalekBackend.sign(digest, &self.key))
    }

    fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

// ─── Card signing ────────────────────────────────────────────────────────

/// Fingerprint and sign a card in place.
///
/// Any existing `fingerprint` and `sig` are ignored for hashing and
/// replaced. Returns the new fingerprint.
pub fn sign_card(
    card: &mut Card,
    key_id: &str,
    provider: &dyn KeyProvider,
) -> Result<Fingerprint, CryptoError> {
    let computed = compute_fingerprint(card)?;
    let signature = provider.sign(&computed.digest)?;
    card.set_fingerprint(&computed.fingerprint);
    card.set_signature(&SignatureBlock::new(
        DalekBackend.algorithm(),
        key_id,
        signature.to_base64url(),
    ));
    tracing::debug!(
        fingerprint = %computed.fingerprint,
        key_id,
        provider = provider.provider_name(),
        "card signed"
    );
    Ok(computed.fingerprint)
}

// ─── Tests ──────────────────────────────────────────────────────────────
