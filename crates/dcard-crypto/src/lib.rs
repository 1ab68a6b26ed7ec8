//! # dcard-crypto — Card Signing and Trust
//!
//! - **Ed25519** key pairs, public keys and signatures with base64url
//!   encoding. Only `ContentDigest` values can be signed.
//! - **`SignatureBackend`**: the capability trait behind which the
//!   primitive lives (`DalekBackend` by default).
//! - **Key providers**: where the issuer key comes from (memory, key file,
//!   environment), plus [`sign_card`].
//! - **`TrustRegistry`**: `keyId → {issuer, publicKey}`.
//! - **`SignatureVerifier`**: the ordered `sig` checks, reporting failures
//!   as values.
//!
//! ## Crate Policy
//!
//! - Depends only on `dcard-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   SHA-256 and real Ed25519 with fixed seeds.

pub mod backend;
pub mod ed25519;
pub mod error;
pub mod key_provider;
pub mod registry;
pub mod verifier;

pub use backend::{DalekBackend, SignatureBackend};
pub use ed25519::{
    base64url_decode, base64url_encode, verify, Ed25519KeyPair, Ed25519PublicKey,
    Ed25519Signature,
};
pub use error::CryptoError;
pub use key_provider::{
    sign_card, EnvKeyProvider, KeyProvider, LocalKeyProvider, DEFAULT_KEY_ID, PRIVKEY_ENV_VAR,
};
pub use registry::{TrustRegistry, TrustedKey, BUILTIN_KEY_ID};
pub use verifier::{SignatureCheck, SignatureVerifier, SUPPORTED_ALGORITHM};
