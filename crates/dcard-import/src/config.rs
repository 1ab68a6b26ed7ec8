//! Import configuration.
//!
//! Loaded from environment variables, or built explicitly by tests and the
//! CLI. Configuration is passed into the pipeline by value; nothing here is
//! process-global.

use std::path::PathBuf;

use dcard_crypto::{CryptoError, TrustRegistry};
use url::Url;

/// Default base location that relative references resolve against.
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for resolving, verifying, and storing imported cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Location relative references and the manifest resolve against.
    pub base_url: Url,
    /// Gateway used when a direct fetch fails. `None` leaves the fallback
    /// unconfigured.
    pub gateway_url: Option<Url>,
    /// Treat missing or invalid signatures as hard failures.
    pub strict: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// JSON key table replacing the built-in trust registry.
    pub trusted_keys: Option<PathBuf>,
}

impl ImportConfig {
    /// Configuration with the given base location and default settings.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            gateway_url: None,
            strict: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            trusted_keys: None,
        }
    }

    /// Configuration rooted at [`DEFAULT_BASE_URL`].
    pub fn localhost() -> Result<Self, ConfigError> {
        Ok(Self::new(parse_url("base URL", DEFAULT_BASE_URL)?))
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DCARD_BASE_URL` (default: `http://localhost/`)
    /// - `DCARD_GATEWAY_URL` (default: unset)
    /// - `DCARD_STRICT` (`1`, `true` or `yes` enables; default off)
    /// - `DCARD_TIMEOUT_SECS` (default: 30)
    /// - `DCARD_TRUSTED_KEYS` (path to a key table; default: built-in)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("DCARD_BASE_URL", DEFAULT_BASE_URL)?,
            gateway_url: env_optional_url("DCARD_GATEWAY_URL")?,
            strict: env_flag("DCARD_STRICT"),
            timeout_secs: std::env::var("DCARD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            trusted_keys: std::env::var_os("DCARD_TRUSTED_KEYS")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    /// The trust registry this configuration selects.
    pub fn load_registry(&self) -> Result<TrustRegistry, CryptoError> {
        match &self.trusted_keys {
            Some(path) => TrustRegistry::from_file(path),
            None => Ok(TrustRegistry::builtin()),
        }
    }
}

/// Parse a URL-valued setting, naming the setting on failure.
pub fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_optional_url(var: &str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => parse_url(var, &raw).map(Some),
        _ => Ok(None),
    }
}

fn env_flag(var: &str) -> bool {
    std::env::var(var)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
