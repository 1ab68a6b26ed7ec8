//! # Signing Subcommands
//!
//! Issuer key generation and card signing.
//!
//! The private key comes from a key file written by `dcard keygen`, or from
//! the `DCARD_PRIVKEY_BASE64URL` environment variable when no file is given.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use dcard_core::Card;
use dcard_crypto::{
    sign_card, Ed25519KeyPair, EnvKeyProvider, KeyProvider, LocalKeyProvider, DEFAULT_KEY_ID,
    PRIVKEY_ENV_VAR,
};

/// Arguments for `dcard keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the keypair files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "dcard")]
    pub prefix: String,
}

/// Arguments for `dcard sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Card to sign.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Where to write the signed card. Defaults to `<fingerprint>.dcard`
    /// next to the input.
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
    /// Private key file (base64url seed).
    #[arg(long)]
    pub key: Option<PathBuf>,
    /// Registry key id to sign under.
    #[arg(long)]
    pub key_id: Option<String>,
}

/// Execute `dcard keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    cmd_keygen(&args.output, &args.prefix)
}

/// Execute `dcard sign`.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let provider = key_provider(args.key.as_deref(), PRIVKEY_ENV_VAR)?;
    let written = cmd_sign(
        &args.input,
        args.output.as_deref(),
        args.key_id.as_deref(),
        provider.as_ref(),
    )?;
    println!("Wrote {}", written.display());
    Ok(0)
}

fn cmd_keygen(output_dir: &Path, prefix: &str) -> Result<u8> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let keypair = Ed25519KeyPair::generate();
    let public_key = keypair.public_key().to_base64url();

    let sk_path = output_dir.join(format!("{prefix}.key"));
    let pk_path = output_dir.join(format!("{prefix}.pub"));

    std::fs::write(&sk_path, keypair.seed_base64url().as_bytes())
        .with_context(|| format!("failed to write private key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, &public_key)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    println!("OK: generated Ed25519 keypair");
    println!("  Private key: {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());
    println!("  Public key (base64url): {public_key}");

    Ok(0)
}

/// Pick the signing key: an explicit key file wins over the environment.
fn key_provider(key_file: Option<&Path>, env_var: &str) -> Result<Box<dyn KeyProvider>> {
    match key_file {
        Some(path) => {
            let provider = LocalKeyProvider::from_file(path)
                .with_context(|| format!("failed to load private key: {}", path.display()))?;
            Ok(Box::new(provider))
        }
        None => {
            let provider = EnvKeyProvider::from_env(env_var)
                .with_context(|| format!("Missing {env_var} env var for signing."))?;
            Ok(Box::new(provider))
        }
    }
}

/// Sign `input` and write the result. Returns the path written.
fn cmd_sign(
    input: &Path,
    output: Option<&Path>,
    key_id: Option<&str>,
    provider: &dyn KeyProvider,
) -> Result<PathBuf> {
    let mut card = crate::read_card(input)?;
    let key_id = key_id
        .map(str::to_string)
        .or_else(|| existing_key_id(&card))
        .unwrap_or_else(|| DEFAULT_KEY_ID.to_string());

    let fingerprint = sign_card(&mut card, &key_id, provider).context("failed to sign card")?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("{fingerprint}.dcard")),
    };
    let json = serde_json::to_string_pretty(&card).context("failed to serialize card")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write signed card: {}", path.display()))?;

    tracing::info!(%fingerprint, key_id = %key_id, path = %path.display(), "signed card");
    Ok(path)
}

fn existing_key_id(card: &Card) -> Option<String> {
    card.signature_block()
        .and_then(Result::ok)
        .and_then(|block| block.key_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcard_core::{verify_fingerprint, SignatureBlock};
    use serde_json::json;

    fn write_card(dir: &Path, value: serde_json::Value) -> PathBuf {
        let path = dir.join("card.json");
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn keygen_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cmd_keygen(dir.path(), "issuer").unwrap(), 0);

        let seed = std::fs::read_to_string(dir.path().join("issuer.key")).unwrap();
        let public = std::fs::read_to_string(dir.path().join("issuer.pub")).unwrap();
        assert_eq!(seed.len(), 43);
        assert_eq!(public.len(), 43);

        let provider = LocalKeyProvider::from_file(&dir.path().join("issuer.key")).unwrap();
        assert_eq!(provider.public_key().to_base64url(), public);
    }

    #[test]
    fn sign_without_key_reports_missing_env_var() {
        let err = key_provider(None, "DCARD_TEST_UNSET_PRIVKEY_7F3A")
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("Missing DCARD_TEST_UNSET_PRIVKEY_7F3A env var"));
    }

    #[test]
    fn sign_writes_fingerprint_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_card(dir.path(), json!({"name": "Ada", "rarity": "rare"}));
        let provider = LocalKeyProvider::from_seed(&[5u8; 32]);

        let written = cmd_sign(&input, None, None, &provider).unwrap();
        let card = crate::read_card(&written).unwrap();
        let fingerprint = card.get("fingerprint").unwrap().as_str().unwrap();

        assert_eq!(
            written.file_name().unwrap().to_str().unwrap(),
            format!("{fingerprint}.dcard")
        );
        assert!(verify_fingerprint(&card).unwrap().ok);
        let block = card.signature_block().unwrap().unwrap();
        assert_eq!(block.key_id.as_deref(), Some(DEFAULT_KEY_ID));
        assert_eq!(block.alg.as_deref(), Some("Ed25519"));

        let text = std::fs::read_to_string(&written).unwrap();
        assert!(text.contains("\n  \"name\""));
    }

    #[test]
    fn sign_keeps_existing_key_id_unless_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let mut card = Card::from_value(json!({"name": "Grace"})).unwrap();
        card.set_signature(&SignatureBlock::new("Ed25519", "acme-2024", "stale".into()));
        let input = write_card(dir.path(), card.into_value());
        let provider = LocalKeyProvider::from_seed(&[6u8; 32]);

        let kept = cmd_sign(&input, Some(&dir.path().join("a.dcard")), None, &provider).unwrap();
        let kept = crate::read_card(&kept).unwrap();
        assert_eq!(
            kept.signature_block().unwrap().unwrap().key_id.as_deref(),
            Some("acme-2024")
        );

        let replaced = cmd_sign(
            &input,
            Some(&dir.path().join("b.dcard")),
            Some("acme-2025"),
            &provider,
        )
        .unwrap();
        let replaced = crate::read_card(&replaced).unwrap();
        assert_eq!(
            replaced.signature_block().unwrap().unwrap().key_id.as_deref(),
            Some("acme-2025")
        );
    }

    #[test]
    fn resigning_ignores_previous_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_card(
            dir.path(),
            json!({"name": "Linus", "fingerprint": "sha256-bogus"}),
        );
        let provider = LocalKeyProvider::from_seed(&[7u8; 32]);
        let written = cmd_sign(&input, None, None, &provider).unwrap();
        assert!(verify_fingerprint(&crate::read_card(&written).unwrap()).unwrap().ok);
    }
}
