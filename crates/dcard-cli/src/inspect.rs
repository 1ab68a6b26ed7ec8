//! # Inspection Subcommands
//!
//! Offline fingerprinting and verification of card files. Nothing here
//! touches the network or the collection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use dcard_core::compute_fingerprint;
use dcard_crypto::SignatureVerifier;
use dcard_import::{CardVerifier, VerificationResult};

/// Arguments for `dcard fingerprint`.
#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Card file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for `dcard verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Card file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// JSON key table replacing the built-in trust registry.
    #[arg(long)]
    pub registry: Option<PathBuf>,
    /// Fail on missing or invalid signatures.
    #[arg(long)]
    pub strict: bool,
}

/// Execute `dcard fingerprint`.
pub fn run_fingerprint(args: &FingerprintArgs) -> Result<u8> {
    let card = crate::read_card(&args.file)?;
    let computed = compute_fingerprint(&card).context("failed to fingerprint card")?;
    println!("{}", computed.fingerprint);
    Ok(0)
}

/// Execute `dcard verify`. Prints the verdict as JSON.
///
/// Any verdict exits 0. Integrity failures, and signature failures under
/// `--strict`, are errors.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let verdict = verify_file(args)?;
    let json = serde_json::to_string_pretty(&verdict).context("failed to serialize verdict")?;
    println!("{json}");
    Ok(0)
}

fn verify_file(args: &VerifyArgs) -> Result<VerificationResult> {
    let registry = crate::load_registry(args.registry.as_deref())?;
    let verifier = CardVerifier::new(SignatureVerifier::new(Arc::new(registry)), args.strict);
    let mut card = crate::read_card(&args.file)?;
    verifier
        .verify(&mut card)
        .with_context(|| format!("verification failed: {}", args.file.display()))
}
