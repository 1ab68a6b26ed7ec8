//! Import error types.
//!
//! [`ImportError::category`] groups failures the way hosts report them:
//! transport problems may have been retried or routed through the gateway,
//! integrity failures always reject the card, and authentication failures
//! only surface as errors in strict mode.

use dcard_core::{CanonicalizationError, CardError, Fingerprint};
use dcard_crypto::CryptoError;

use crate::config::ConfigError;

/// Errors from fetching a JSON document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// HTTP transport error, after retries.
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("failed to fetch {url} ({status}): {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// The response body is not JSON.
    #[error("failed to decode JSON from {url}: {source}")]
    Decode {
        url: String,
        source: reqwest::Error,
    },
}

/// How a failed import should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Fetch, manifest, or gateway failure.
    Transport,
    /// Declared fingerprint missing or wrong.
    Integrity,
    /// Signature missing or invalid under strict mode.
    Authentication,
    /// Unusable input or local configuration.
    Invalid,
}

/// Errors from the import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The import reference is empty or cannot be turned into a URL.
    #[error("invalid import reference {0:?}")]
    InvalidReference(String),

    /// A document fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The gateway manifest is not a fingerprint table.
    #[error("invalid manifest at {url}: {reason}")]
    ManifestInvalid { url: String, reason: String },

    /// The manifest has no entry for the card's fingerprint.
    #[error("fingerprint {0} not found in manifest")]
    FingerprintNotFound(String),

    /// No gateway base URL from the caller, configuration, or default.
    #[error("gateway URL not configured")]
    GatewayNotConfigured,

    /// The fetched document is not a card.
    #[error("invalid card document: {0}")]
    InvalidDocument(#[from] CardError),

    /// A signed card carries no fingerprint.
    #[error("signed card has no fingerprint; card integrity failed")]
    MissingFingerprint,

    /// The declared fingerprint does not match the card content.
    #[error("fingerprint mismatch (declared {declared}, computed {computed}); card integrity failed")]
    FingerprintMismatch {
        declared: String,
        computed: Fingerprint,
    },

    /// Strict mode and the card is unsigned.
    #[error("signature required in strict mode")]
    SignatureRequired,

    /// Strict mode and the signature did not verify.
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    /// Card content could not be canonicalized.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The trust registry could not be loaded.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ImportError {
    /// The reporting category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_)
            | Self::ManifestInvalid { .. }
            | Self::FingerprintNotFound(_)
            | Self::GatewayNotConfigured => ErrorCategory::Transport,
            Self::MissingFingerprint | Self::FingerprintMismatch { .. } => ErrorCategory::Integrity,
            Self::SignatureRequired | Self::SignatureInvalid(_) => ErrorCategory::Authentication,
            Self::InvalidReference(_)
            | Self::InvalidDocument(_)
            | Self::Canonicalization(_)
            | Self::Config(_)
            | Self::Crypto(_) => ErrorCategory::Invalid,
        }
    }
}

/// Errors from a card store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored record does not match its fingerprint.
    #[error("corrupt record at {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
