//! # Card Document Model
//!
//! A card is an arbitrary JSON object. Two top-level fields are reserved by
//! the integrity protocol and excluded from hashing:
//!
//! - `fingerprint` — `sha256-<base64url>` of the canonical content.
//! - `sig` — `{alg, keyId, signature}` over the fingerprint's digest bytes.
//!
//! `version` is also reserved but is hashed like any other field. Every
//! other field is application-defined and opaque to this crate.
//!
//! A reserved field holding JSON `null` is treated as absent. So is an empty
//! `fingerprint` string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CardError, DcardError};
use crate::fingerprint::Fingerprint;

/// Top-level field carrying the card fingerprint.
pub const FINGERPRINT_FIELD: &str = "fingerprint";
/// Top-level field carrying the signature block.
pub const SIG_FIELD: &str = "sig";
/// Top-level field carrying the card format version.
pub const VERSION_FIELD: &str = "version";

/// A card document: a JSON object with protocol-aware accessors.
///
/// Key insertion order is preserved, so a card re-emitted by tooling keeps
/// its authored layout. Hashing never depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Card(Map<String, Value>);

/// The `sig` block of a signed card.
///
/// Fields are optional so that a partially-filled block still parses; the
/// signature verifier reports which piece is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    /// Algorithm identifier. Only `Ed25519` is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Trust registry key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Unpadded base64url signature bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl SignatureBlock {
    /// A complete block for the given algorithm, key and encoded signature.
    pub fn new(alg: &str, key_id: &str, signature: String) -> Self {
        Self {
            alg: Some(alg.to_string()),
            key_id: Some(key_id.to_string()),
            signature: Some(signature),
        }
    }
}

impl Card {
    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, CardError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CardError::NotAnObject(json_kind(&other))),
        }
    }

    /// Parse a card from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DcardError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(value)?)
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the card, returning it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level application field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// The declared fingerprint value, if any.
    ///
    /// Returns the raw value so callers can tell a wrong fingerprint from a
    /// wrongly-typed one. `null` and `""` count as absent.
    pub fn declared_fingerprint(&self) -> Option<&Value> {
        match self.0.get(FINGERPRINT_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        }
    }

    /// Attach or replace the fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: &Fingerprint) {
        self.0.insert(
            FINGERPRINT_FIELD.to_string(),
            Value::String(fingerprint.as_str().to_string()),
        );
    }

    /// Whether the card carries a `sig` field.
    pub fn has_signature(&self) -> bool {
        !matches!(self.0.get(SIG_FIELD), None | Some(Value::Null))
    }

    /// Parse the `sig` field.
    ///
    /// Returns `None` when absent and an error when present but not an
    /// object with string members.
    pub fn signature_block(&self) -> Option<Result<SignatureBlock, CardError>> {
        match self.0.get(SIG_FIELD) {
            None | Some(Value::Null) => None,
            Some(v @ Value::Object(_)) => Some(
                serde_json::from_value(v.clone())
                    .map_err(|e| CardError::MalformedSignature(e.to_string())),
            ),
            Some(other) => Some(Err(CardError::MalformedSignature(format!(
                "expected an object, got {}",
                json_kind(other)
            )))),
        }
    }

    /// Attach or replace the signature block.
    pub fn set_signature(&mut self, block: &SignatureBlock) {
        let mut sig = Map::new();
        if let Some(alg) = &block.alg {
            sig.insert("alg".to_string(), Value::String(alg.clone()));
        }
        if let Some(key_id) = &block.key_id {
            sig.insert("keyId".to_string(), Value::String(key_id.clone()));
        }
        if let Some(signature) = &block.signature {
            sig.insert("signature".to_string(), Value::String(signature.clone()));
        }
        self.0.insert(SIG_FIELD.to_string(), Value::Object(sig));
    }

    /// The `version` field, if present.
    pub fn version(&self) -> Option<&Value> {
        self.0.get(VERSION_FIELD)
    }

    /// A deep copy with the top-level `fingerprint` and `sig` removed.
    ///
    /// This is the value that gets hashed. Nested fields with the same names
    /// are kept.
    pub fn hashable_content(&self) -> Value {
        let mut copy = self.0.clone();
        copy.remove(FINGERPRINT_FIELD);
        copy.remove(SIG_FIELD);
        Value::Object(copy)
    }
}

impl TryFrom<Value> for Card {
    type Error = CardError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Card> for Value {
    fn from(card: Card) -> Self {
        card.into_value()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
