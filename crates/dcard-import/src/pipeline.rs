//! # Import Pipeline
//!
//! One import runs strictly in order: resolve, verify, persist, hand the
//! card to the host, notify. A failure skips every later stage. Clearing
//! the triggering reference always happens, exactly once, through a drop
//! guard, whether the import succeeds, fails, or unwinds.
//!
//! Persistence failures are logged and do not fail the import.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dcard_core::Card;
use dcard_crypto::SignatureVerifier;
use url::Url;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::fetch::HttpFetcher;
use crate::resolver::{ImportResolver, ResolutionSource};
use crate::store::{CardStore, StoredCard};
use crate::verify::{CardVerifier, VerificationResult};

/// Message passed to [`ImportHooks::notify`] after a successful import.
pub const SUCCESS_MESSAGE: &str = "Added to collection from QR import";

/// Host callbacks for an import.
#[async_trait]
pub trait ImportHooks: Send + Sync {
    /// The card was verified and persistence was attempted.
    async fn on_card_loaded(&self, _card: &Card, _verdict: &VerificationResult) {}

    /// A short human-readable outcome message.
    fn notify(&self, _message: &str) {}

    /// Remove the import reference from the host's navigation state.
    fn clear_reference(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ImportHooks for NoopHooks {}

/// A completed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// The verified card, with its fingerprint attached.
    pub card: Card,
    /// The verdict.
    pub verification: VerificationResult,
    /// Which resolution path produced the card.
    pub source: ResolutionSource,
    /// Whether the card reached the store.
    pub persisted: bool,
}

/// Resolves, verifies, and stores imported cards.
#[derive(Clone)]
pub struct ImportPipeline {
    resolver: ImportResolver,
    verifier: CardVerifier,
    store: Option<Arc<dyn CardStore>>,
}

impl ImportPipeline {
    /// Assemble a pipeline from its parts.
    pub fn new(
        resolver: ImportResolver,
        verifier: CardVerifier,
        store: Option<Arc<dyn CardStore>>,
    ) -> Self {
        Self {
            resolver,
            verifier,
            store,
        }
    }

    /// Build the production pipeline: HTTP fetcher, configured registry and
    /// gateway, and the given store.
    pub fn from_config(
        config: &ImportConfig,
        store: Option<Arc<dyn CardStore>>,
    ) -> Result<Self, ImportError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
        let registry = Arc::new(config.load_registry()?);
        let resolver = ImportResolver::new(Arc::new(fetcher), config.base_url.clone())
            .with_gateway(config.gateway_url.clone());
        let verifier = CardVerifier::new(SignatureVerifier::new(registry), config.strict);
        Ok(Self::new(resolver, verifier, store))
    }

    /// Run one import.
    ///
    /// `hooks.clear_reference()` runs exactly once before this returns.
    pub async fn process_import(
        &self,
        reference: &str,
        gateway_override: Option<&Url>,
        hooks: &dyn ImportHooks,
    ) -> Result<ImportOutcome, ImportError> {
        let _cleanup = ClearReferenceGuard(hooks);

        match self.run(reference, gateway_override, hooks).await {
            Ok(outcome) => {
                hooks.notify(SUCCESS_MESSAGE);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    reference,
                    category = ?e.category(),
                    "import failed: {e}"
                );
                hooks.notify(&format!("Import failed: {e}"));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        reference: &str,
        gateway_override: Option<&Url>,
        hooks: &dyn ImportHooks,
    ) -> Result<ImportOutcome, ImportError> {
        let resolved = self.resolver.resolve(reference, gateway_override).await?;
        let mut card = resolved.card;
        let verification = self.verifier.verify(&mut card)?;
        let persisted = self.persist(&card, &verification).await;
        hooks.on_card_loaded(&card, &verification).await;
        Ok(ImportOutcome {
            card,
            verification,
            source: resolved.source,
            persisted,
        })
    }

    async fn persist(&self, card: &Card, verdict: &VerificationResult) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.save(StoredCard::new(card.clone(), verdict)).await {
            Ok(()) => {
                tracing::info!(fingerprint = %verdict.fingerprint, status = %verdict.status, "card stored");
                true
            }
            Err(e) => {
                tracing::warn!(fingerprint = %verdict.fingerprint, "card store save failed: {e}");
                false
            }
        }
    }
}

impl std::fmt::Debug for ImportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportPipeline")
            .field("resolver", &self.resolver)
            .field("strict", &self.verifier.is_strict())
            .field("store", &self.store.is_some())
            .finish()
    }
}

struct ClearReferenceGuard<'a>(&'a dyn ImportHooks);

impl Drop for ClearReferenceGuard<'_> {
    fn drop(&mut self) {
        self.0.clear_reference();
    }
}
