//! # Trust Registry
//!
//! Maps a `keyId` to the issuer and public key that cards signed under it
//! must verify against. The registry is immutable once built and is shared
//! behind an `Arc`.
//!
//! A caller-supplied table replaces the built-in one wholesale. There is no
//! merging.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ed25519::Ed25519PublicKey;
use crate::error::CryptoError;

/// Key id of the built-in trusted entry.
pub const BUILTIN_KEY_ID: &str = "inspire-main-2025";

const BUILTIN_ISSUER: &str = "INSPIRE";
const BUILTIN_PUBLIC_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// A trusted issuer key as stored in a key table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedKey {
    /// Display name of the issuer.
    pub issuer: String,
    /// base64url-encoded 32-byte Ed25519 public key.
    pub public_key: String,
}

impl TrustedKey {
    /// Create an entry from an issuer name and a public key.
    pub fn new(issuer: impl Into<String>, public_key: &Ed25519PublicKey) -> Self {
        Self {
            issuer: issuer.into(),
            public_key: public_key.to_base64url(),
        }
    }

    /// Decode the stored public key.
    pub fn decode_public_key(&self) -> Result<Ed25519PublicKey, CryptoError> {
        Ed25519PublicKey::from_base64url(&self.public_key)
    }
}

/// Read-only `keyId → TrustedKey` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustRegistry {
    keys: BTreeMap<String, TrustedKey>,
}

impl TrustRegistry {
    /// The built-in registry with its single default issuer.
    pub fn builtin() -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(
            BUILTIN_KEY_ID.to_string(),
            TrustedKey {
                issuer: BUILTIN_ISSUER.to_string(),
                public_key: BUILTIN_PUBLIC_KEY.to_string(),
            },
        );
        Self { keys }
    }

    /// A registry holding exactly the given entries.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, TrustedKey)>,
        K: Into<String>,
    {
        Self {
            keys: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a `{keyId: {issuer, publicKey}}` JSON table.
    ///
    /// Public keys are not decoded here; a bad key only fails verification
    /// of cards that reference it.
    pub fn from_json_str(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json).map_err(|e| CryptoError::Registry(e.to_string()))
    }

    /// Load a key table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CryptoError> {
        let text = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&text)
            .map_err(|e| CryptoError::Registry(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), keys = registry.len(), "loaded trust registry");
        Ok(registry)
    }

    /// Look up a key id.
    pub fn lookup(&self, key_id: &str) -> Option<&TrustedKey> {
        self.keys.get(key_id)
    }

    /// Number of trusted keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the registry trusts no keys at all.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over `(keyId, entry)` pairs in key id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrustedKey)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for TrustRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::Ed25519KeyPair;

    #[test]
    fn builtin_has_single_default_entry() {
        let registry = TrustRegistry::builtin();
        assert_eq!(registry.len(), 1);
        let entry = registry.lookup("inspire-main-2025").unwrap();
        assert_eq!(entry.issuer, "INSPIRE");
        assert_eq!(entry.decode_public_key().unwrap().as_bytes(), &[0u8; 32]);
        assert!(registry.lookup("other").is_none());
    }

    #[test]
    fn default_is_builtin() {
        assert_eq!(TrustRegistry::default(), TrustRegistry::builtin());
    }

    #[test]
    fn override_replaces_builtin() {
        let pk = Ed25519KeyPair::from_seed(&[1u8; 32]).public_key();
        let registry = TrustRegistry::from_entries([("k1", TrustedKey::new("Acme", &pk))]);
        assert!(registry.lookup(BUILTIN_KEY_ID).is_none());
        assert_eq!(registry.lookup("k1").unwrap().decode_public_key().unwrap(), pk);
    }

    #[test]
    fn parses_json_table() {
        let json = r#"{
            "acme-2025": {"issuer": "Acme", "publicKey": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"},
            "bad": {"issuer": "Broken", "publicKey": "short"}
        }"#;
        let registry = TrustRegistry::from_json_str(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("acme-2025").unwrap().decode_public_key().is_ok());
        assert!(registry.lookup("bad").unwrap().decode_public_key().is_err());
    }

    #[test]
    fn rejects_wrong_table_shape() {
        assert!(matches!(
            TrustRegistry::from_json_str(r#"{"k": "not an entry"}"#),
            Err(CryptoError::Registry(_))
        ));
        assert!(TrustRegistry::from_json_str("[]").is_err());
    }

    #[test]
    fn loads_from_file_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        let pk = Ed25519KeyPair::from_seed(&[2u8; 32]).public_key();
        let registry = TrustRegistry::from_entries([("k2", TrustedKey::new("Beta", &pk))]);
        std::fs::write(&path, serde_json::to_string(&registry).unwrap()).unwrap();

        let loaded = TrustRegistry::from_file(&path).unwrap();
        assert_eq!(loaded, registry);
        assert_eq!(loaded.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["k2"]);
    }
}
