//! # dcard-core — Foundational Types for Portable Cards
//!
//! This crate is the leaf of the dcard workspace. It defines the pieces of
//! the integrity protocol that every producer and consumer of a card must
//! agree on byte-for-byte:
//!
//! - **`CanonicalBytes`** — the only path to bytes that get hashed. Keys are
//!   sorted recursively and the value is serialized as RFC 8785 canonical
//!   JSON, so two cards that differ only in key order hash identically.
//! - **`ContentDigest`** — a SHA-256 digest that can only be computed from
//!   `&CanonicalBytes`.
//! - **`Fingerprint`** — the `sha256-<base64url>` text form of a card's
//!   digest, computed with the top-level `fingerprint` and `sig` fields
//!   excluded.
//! - **`Card`** — a JSON object with typed accessors for the reserved
//!   protocol fields. Application fields stay opaque.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dcard-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod card;
pub mod digest;
pub mod error;
pub mod fingerprint;

pub use canonical::{canonical_serialize, canonicalize, CanonicalBytes};
pub use card::{Card, SignatureBlock};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CardError, DcardError};
pub use fingerprint::{
    compute_fingerprint, verify_fingerprint, ComputedFingerprint, Fingerprint, FingerprintCheck,
};
