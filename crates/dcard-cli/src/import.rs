//! # Collection Subcommands
//!
//! `dcard import` runs the full import pipeline against a reference and
//! stores the result in a filesystem collection; `dcard list` prints it.
//!
//! Settings start from the `DCARD_*` environment variables and are then
//! overridden by flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use url::Url;

use dcard_core::Card;
use dcard_import::{
    CardStore, FsCardStore, ImportConfig, ImportHooks, ImportPipeline, StoredCard,
    VerificationResult,
};

/// Arguments for `dcard import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Card reference: a URL or a path relative to the base URL.
    #[arg(value_name = "REFERENCE")]
    pub reference: String,
    /// Base URL for relative references and the manifest.
    #[arg(long)]
    pub base_url: Option<Url>,
    /// Gateway used when the direct fetch fails.
    #[arg(long)]
    pub gateway: Option<Url>,
    /// Collection directory.
    #[arg(long, default_value = "collection")]
    pub store: PathBuf,
    /// JSON key table replacing the built-in trust registry.
    #[arg(long)]
    pub registry: Option<PathBuf>,
    /// Fail on missing or invalid signatures.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `dcard list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection directory.
    #[arg(long, default_value = "collection")]
    pub store: PathBuf,
}

/// Execute `dcard import`.
pub fn run_import(args: &ImportArgs) -> Result<u8> {
    let mut config = ImportConfig::from_env().context("invalid DCARD_* environment")?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if args.registry.is_some() {
        config.trusted_keys = args.registry.clone();
    }
    config.strict |= args.strict;

    let store: Arc<dyn CardStore> = Arc::new(FsCardStore::new(&args.store));
    let pipeline =
        ImportPipeline::from_config(&config, Some(store)).context("failed to set up import")?;

    let outcome = runtime()?
        .block_on(pipeline.process_import(&args.reference, args.gateway.as_ref(), &ConsoleHooks))?;

    let json = serde_json::to_string_pretty(&outcome.verification)
        .context("failed to serialize verdict")?;
    println!("{json}");
    if !outcome.persisted {
        tracing::warn!(store = %args.store.display(), "card was not saved to the collection");
    }
    Ok(0)
}

/// Execute `dcard list`.
pub fn run_list(args: &ListArgs) -> Result<u8> {
    let records = runtime()?.block_on(list_records(&args.store))?;
    if records.is_empty() {
        println!("No cards in {}", args.store.display());
    }
    for record in &records {
        println!("{}", describe(record));
    }
    Ok(0)
}

async fn list_records(dir: &Path) -> Result<Vec<StoredCard>> {
    FsCardStore::new(dir)
        .list()
        .await
        .with_context(|| format!("failed to read collection: {}", dir.display()))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn describe(record: &StoredCard) -> String {
    let status = if record.verified {
        "verified"
    } else if record.unsigned {
        "unsigned"
    } else {
        "unverified"
    };
    let name = record
        .document
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("-");
    format!(
        "{}  {:<10}  {}  {}",
        record.fingerprint,
        status,
        record.added_at.format("%Y-%m-%d %H:%M:%S"),
        name
    )
}

/// Reports import progress on the terminal.
struct ConsoleHooks;

#[async_trait]
impl ImportHooks for ConsoleHooks {
    async fn on_card_loaded(&self, _card: &Card, verdict: &VerificationResult) {
        tracing::info!(fingerprint = %verdict.fingerprint, status = %verdict.status, "card loaded");
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}
