//! # dcard-cli — Command-Line Interface for dcard
//!
//! Provides the `dcard` binary:
//!
//! - `dcard keygen` — Ed25519 issuer keypair generation.
//! - `dcard sign` — fingerprint and sign a card file.
//! - `dcard fingerprint` — print a card's computed fingerprint.
//! - `dcard verify` — offline verdict for a card file.
//! - `dcard import` — resolve, verify, and store a card reference.
//! - `dcard list` — list the local collection.
//!
//! Argument parsing lives in `main.rs`; handlers here delegate to the
//! domain crates and return a process exit code.

pub mod import;
pub mod inspect;
pub mod signing;

use std::path::Path;

use anyhow::{Context, Result};
use dcard_core::Card;
use dcard_crypto::TrustRegistry;

/// Read and parse a card file.
pub fn read_card(path: &Path) -> Result<Card> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read card: {}", path.display()))?;
    Card::from_slice(&bytes).with_context(|| format!("failed to parse card: {}", path.display()))
}

/// The key table at `path`, or the built-in registry.
pub fn load_registry(path: Option<&Path>) -> Result<TrustRegistry> {
    match path {
        Some(path) => TrustRegistry::from_file(path)
            .with_context(|| format!("failed to load trust registry: {}", path.display())),
        None => Ok(TrustRegistry::builtin()),
    }
}
