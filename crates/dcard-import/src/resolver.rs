//! # Import Resolver
//!
//! Turns an import reference (a URL or a path, usually decoded from a QR
//! code) into a card document.
//!
//! 1. A reference starting with `http://` or `https://` is used as is.
//!    Anything else has one leading `/` stripped and is joined onto the base
//!    location, so `/cards/x.dcard` lands beside the importing page.
//! 2. When the URL path ends in `cards/<fingerprint>.dcard` (any case), the
//!    fingerprint is kept as a hint. It is not validated here.
//! 3. The URL is fetched directly.
//! 4. If that fails and a hint exists, the card is looked up in the manifest
//!    at `cards/index.json` and fetched through the gateway as
//!    `<gateway>?fileId=<driveId>`.
//!
//! The manifest is fetched fresh on every fallback.

use std::sync::Arc;

use dcard_core::Card;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ImportError;
use crate::fetch::DocumentFetcher;

/// Manifest location, relative to the base URL.
pub const MANIFEST_PATH: &str = "cards/index.json";

/// Gateway query parameter carrying the storage identifier.
pub const GATEWAY_FILE_ID_PARAM: &str = "fileId";

/// Directory segment that marks a fingerprint-named card path.
const CARDS_SEGMENT: &str = "cards";

/// File extension of a fingerprint-named card.
const CARD_EXTENSION: &str = ".dcard";

/// Which path produced a resolved card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Fetched from the reference URL.
    Direct,
    /// Fetched through the manifest and gateway.
    Gateway,
}

/// A fetched card and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedCard {
    /// The parsed card. Not yet verified.
    pub card: Card,
    /// Fingerprint taken from the reference path, if it had one.
    pub fingerprint_hint: Option<String>,
    /// Direct fetch or gateway fallback.
    pub source: ResolutionSource,
    /// The URL the card was actually fetched from.
    pub url: Url,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "driveId")]
    drive_id: String,
}

/// Resolves import references to cards.
#[derive(Clone)]
pub struct ImportResolver {
    fetcher: Arc<dyn DocumentFetcher>,
    base_url: Url,
    gateway_url: Option<Url>,
}

impl ImportResolver {
    /// A resolver with no configured gateway.
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, base_url: Url) -> Self {
        Self {
            fetcher,
            base_url,
            gateway_url: None,
        }
    }

    /// Set the configured gateway, used when the caller passes none.
    pub fn with_gateway(mut self, gateway_url: Option<Url>) -> Self {
        self.gateway_url = gateway_url;
        self
    }

    /// The base location references resolve against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Turn a reference into an absolute URL.
    pub fn normalize_reference(&self, reference: &str) -> Result<Url, ImportError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImportError::InvalidReference(reference.to_string()));
        }
        let parsed = if is_absolute(reference) {
            Url::parse(reference)
        } else {
            let relative = reference.strip_prefix('/').unwrap_or(reference);
            self.base_url.join(relative)
        };
        parsed.map_err(|_| ImportError::InvalidReference(reference.to_string()))
    }

    /// Resolve a reference to a card.
    ///
    /// `gateway_override` takes precedence over the configured gateway.
    pub async fn resolve(
        &self,
        reference: &str,
        gateway_override: Option<&Url>,
    ) -> Result<ResolvedCard, ImportError> {
        let url = self.normalize_reference(reference)?;
        let fingerprint_hint = extract_fingerprint(&url);
        tracing::debug!(url = %url, fingerprint = ?fingerprint_hint, "resolving card");

        let direct_err = match self.fetcher.fetch_json(&url).await {
            Ok(value) => {
                return Ok(ResolvedCard {
                    card: Card::from_value(value)?,
                    fingerprint_hint,
                    source: ResolutionSource::Direct,
                    url,
                })
            }
            Err(e) => e,
        };

        let Some(fingerprint) = fingerprint_hint else {
            return Err(direct_err.into());
        };
        tracing::warn!(
            url = %url,
            fingerprint = %fingerprint,
            "direct fetch failed, falling back to gateway: {direct_err}"
        );

        let (card, gateway_request) = self.load_from_gateway(&fingerprint, gateway_override).await?;
        Ok(ResolvedCard {
            card,
            fingerprint_hint: Some(fingerprint),
            source: ResolutionSource::Gateway,
            url: gateway_request,
        })
    }

    async fn load_from_gateway(
        &self,
        fingerprint: &str,
        gateway_override: Option<&Url>,
    ) -> Result<(Card, Url), ImportError> {
        let manifest_url = self.base_url.join(MANIFEST_PATH).map_err(|e| {
            ImportError::ManifestInvalid {
                url: format!("{}{MANIFEST_PATH}", self.base_url),
                reason: e.to_string(),
            }
        })?;
        let manifest = self.fetcher.fetch_json(&manifest_url).await?;
        let drive_id = manifest_drive_id(&manifest, fingerprint, &manifest_url)?;

        let base = gateway_override
            .or(self.gateway_url.as_ref())
            .ok_or(ImportError::GatewayNotConfigured)?;
        let mut request = base.clone();
        request
            .query_pairs_mut()
            .append_pair(GATEWAY_FILE_ID_PARAM, &drive_id);

        tracing::debug!(url = %request, fingerprint, "fetching card from gateway");
        let value = self.fetcher.fetch_json(&request).await?;
        Ok((Card::from_value(value)?, request))
    }
}

impl std::fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportResolver")
            .field("base_url", &self.base_url.as_str())
            .field("gateway_url", &self.gateway_url.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Extract the fingerprint from a `.../cards/<fingerprint>.dcard` URL.
///
/// Other extensions, such as the manifest's `index.json`, carry no hint.
pub fn extract_fingerprint(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let [.., dir, file] = segments.as_slice() else {
        return None;
    };
    if !dir.eq_ignore_ascii_case(CARDS_SEGMENT) {
        return None;
    }
    let stem_len = file.len().checked_sub(CARD_EXTENSION.len())?;
    let (stem, ext) = (file.get(..stem_len)?, file.get(stem_len..)?);
    if stem.is_empty() || !ext.eq_ignore_ascii_case(CARD_EXTENSION) {
        return None;
    }
    Some(stem.to_string())
}

fn is_absolute(reference: &str) -> bool {
    let lower = reference
        .get(..8)
        .unwrap_or(reference)
        .to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn manifest_drive_id(manifest: &Value, fingerprint: &str, url: &Url) -> Result<String, ImportError> {
    let table = manifest.as_object().ok_or_else(|| ImportError::ManifestInvalid {
        url: url.to_string(),
        reason: "manifest is not a JSON object".to_string(),
    })?;
    let entry = match table.get(fingerprint) {
        None | Some(Value::Null) => {
            return Err(ImportError::FingerprintNotFound(fingerprint.to_string()))
        }
        Some(entry) => entry,
    };
    let entry: ManifestEntry =
        serde_json::from_value(entry.clone()).map_err(|e| ImportError::ManifestInvalid {
            url: url.to_string(),
            reason: format!("entry for {fingerprint}: {e}"),
        })?;
    Ok(entry.drive_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn extracts_fingerprint_from_cards_path() {
        assert_eq!(
            extract_fingerprint(&url("https://host/app/cards/sha256-abc.dcard")),
            Some("sha256-abc".to_string())
        );
        assert_eq!(
            extract_fingerprint(&url("https://host/CARDS/sha256-abc.DCARD?x=1")),
            Some("sha256-abc".to_string())
        );
        assert_eq!(
            extract_fingerprint(&url("https://host/cards/a.b.dcard")),
            Some("a.b".to_string())
        );
    }

    #[test]
    fn no_fingerprint_outside_convention() {
        for s in [
            "https://host/decks/sha256-abc.dcard",
            "https://host/cards/sha256-abc",
            "https://host/cards/.dcard",
            "https://host/cards/sha256-abc.",
            "https://host/cards/",
            "https://host/sha256-abc.dcard",
            "https://host/cards/index.json",
            "https://host/cards/sha256-abc.json",
            "https://host/cards/sha256-abc.dcard.bak",
        ] {
            assert_eq!(extract_fingerprint(&url(s)), None, "{s}");
        }
    }

    #[test]
    fn absolute_detection_is_case_insensitive() {
        assert!(is_absolute("HTTPS://host/x"));
        assert!(is_absolute("http://host/x"));
        assert!(!is_absolute("/cards/x.dcard"));
        assert!(!is_absolute("ftp://host/x"));
        assert!(!is_absolute("http"));
    }

    #[test]
    fn manifest_lookup() {
        let manifest_url = url("http://localhost/cards/index.json");
        let manifest = serde_json::json!({
            "sha256-abc": {"driveId": "X"},
            "sha256-bad": {"drive": "Y"},
            "sha256-null": null
        });
        assert_eq!(manifest_drive_id(&manifest, "sha256-abc", &manifest_url).unwrap(), "X");
        assert!(matches!(
            manifest_drive_id(&manifest, "sha256-missing", &manifest_url),
            Err(ImportError::FingerprintNotFound(_))
        ));
        assert!(matches!(
            manifest_drive_id(&manifest, "sha256-null", &manifest_url),
            Err(ImportError::FingerprintNotFound(_))
        ));
        assert!(matches!(
            manifest_drive_id(&manifest, "sha256-bad", &manifest_url),
            Err(ImportError::ManifestInvalid { .. })
        ));
        assert!(matches!(
            manifest_drive_id(&serde_json::json!([]), "sha256-abc", &manifest_url),
            Err(ImportError::ManifestInvalid { .. })
        ));
    }
}
