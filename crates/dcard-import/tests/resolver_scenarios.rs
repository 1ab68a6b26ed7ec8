//! # Import Resolver Scenarios
//!
//! Resolution paths driven through a recording fetcher, so each test can
//! assert exactly which URLs were requested and in what order.

mod common;

use std::sync::Arc;

use common::{url, MockFetcher};
use dcard_import::{ImportError, ImportResolver, ResolutionSource};
use serde_json::json;

const BASE: &str = "http://localhost/app/";

fn resolver(fetcher: &Arc<MockFetcher>) -> ImportResolver {
    ImportResolver::new(fetcher.clone(), url(BASE))
}

#[tokio::test]
async fn direct_fetch_success() {
    let fetcher = Arc::new(
        MockFetcher::new().with("http://localhost/app/cards/sha256-abc.dcard", json!({"name": "Ada"})),
    );
    let resolved = resolver(&fetcher)
        .resolve("/cards/sha256-abc.dcard", None)
        .await
        .unwrap();

    assert_eq!(resolved.source, ResolutionSource::Direct);
    assert_eq!(resolved.fingerprint_hint.as_deref(), Some("sha256-abc"));
    assert_eq!(resolved.card.get("name"), Some(&json!("Ada")));
    assert_eq!(fetcher.requests(), vec!["http://localhost/app/cards/sha256-abc.dcard"]);
}

#[tokio::test]
async fn gateway_fallback_uses_manifest_drive_id() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with(
                "http://localhost/app/cards/index.json",
                json!({"sha256-abc": {"driveId": "X"}}),
            )
            .with("https://gw.example?fileId=X", json!({"name": "From gateway"})),
    );
    let gateway = url("https://gw.example");
    let resolved = resolver(&fetcher)
        .resolve("/cards/sha256-abc.dcard", Some(&gateway))
        .await
        .unwrap();

    assert_eq!(resolved.source, ResolutionSource::Gateway);
    assert_eq!(resolved.url, url("https://gw.example?fileId=X"));
    assert_eq!(resolved.card.get("name"), Some(&json!("From gateway")));
    assert_eq!(
        fetcher.requests(),
        vec![
            "http://localhost/app/cards/sha256-abc.dcard".to_string(),
            "http://localhost/app/cards/index.json".to_string(),
            url("https://gw.example?fileId=X").to_string(),
        ]
    );
}

#[tokio::test]
async fn fingerprint_missing_from_manifest_never_calls_gateway() {
    let fetcher = Arc::new(MockFetcher::new().with(
        "http://localhost/app/cards/index.json",
        json!({"sha256-abc": {"driveId": "X"}}),
    ));
    let gateway = url("https://gw.example");
    let err = resolver(&fetcher)
        .resolve("/cards/sha256-missing.dcard", Some(&gateway))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::FingerprintNotFound(ref fp) if fp == "sha256-missing"));
    assert!(fetcher.requests().iter().all(|u| !u.starts_with("https://gw.example")));
}

#[tokio::test]
async fn failure_without_fingerprint_hint_propagates() {
    let fetcher = Arc::new(MockFetcher::new());
    let err = resolver(&fetcher)
        .resolve("https://elsewhere.example/card.json", Some(&url("https://gw.example")))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Fetch(_)));
    assert_eq!(fetcher.requests(), vec!["https://elsewhere.example/card.json"]);
}

#[tokio::test]
async fn unconfigured_gateway_fails_after_manifest_lookup() {
    let fetcher = Arc::new(MockFetcher::new().with(
        "http://localhost/app/cards/index.json",
        json!({"sha256-abc": {"driveId": "X"}}),
    ));
    let err = resolver(&fetcher)
        .resolve("cards/sha256-abc.dcard", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::GatewayNotConfigured));
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn call_time_gateway_overrides_configured_one() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with(
                "http://localhost/app/cards/index.json",
                json!({"sha256-abc": {"driveId": "X"}}),
            )
            .with("https://override.example/get?fileId=X", json!({"name": "override"})),
    );
    let resolver = resolver(&fetcher).with_gateway(Some(url("https://configured.example")));
    let resolved = resolver
        .resolve("/cards/sha256-abc.dcard", Some(&url("https://override.example/get")))
        .await
        .unwrap();
    assert_eq!(resolved.card.get("name"), Some(&json!("override")));
}

#[tokio::test]
async fn configured_gateway_is_used_without_override() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with(
                "http://localhost/app/cards/index.json",
                json!({"sha256-abc": {"driveId": "drive id/1"}}),
            )
            .with(
                "https://configured.example/?fileId=drive+id%2F1",
                json!({"name": "configured"}),
            ),
    );
    let resolver = resolver(&fetcher).with_gateway(Some(url("https://configured.example")));
    let resolved = resolver.resolve("/cards/sha256-abc.dcard", None).await.unwrap();
    assert_eq!(resolved.card.get("name"), Some(&json!("configured")));
}

#[tokio::test]
async fn absolute_references_are_used_as_is() {
    let fetcher = Arc::new(
        MockFetcher::new().with("HTTPS://cdn.example/Cards/sha256-q.dcard", json!({"n": 1})),
    );
    let resolved = resolver(&fetcher)
        .resolve("HTTPS://cdn.example/Cards/sha256-q.dcard", None)
        .await
        .unwrap();
    assert_eq!(resolved.url.as_str(), "https://cdn.example/Cards/sha256-q.dcard");
    assert_eq!(resolved.fingerprint_hint.as_deref(), Some("sha256-q"));
}

#[tokio::test]
async fn empty_reference_is_rejected_before_fetching() {
    let fetcher = Arc::new(MockFetcher::new());
    let err = resolver(&fetcher).resolve("   ", None).await.unwrap_err();
    assert!(matches!(err, ImportError::InvalidReference(_)));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn non_object_document_is_invalid() {
    let fetcher = Arc::new(
        MockFetcher::new().with("http://localhost/app/cards/sha256-abc.dcard", json!([1, 2, 3])),
    );
    let err = resolver(&fetcher)
        .resolve("/cards/sha256-abc.dcard", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidDocument(_)));
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn non_card_extension_has_no_gateway_fallback() {
    let fetcher = Arc::new(MockFetcher::new());
    let err = resolver(&fetcher)
        .resolve("/cards/index.json", Some(&url("https://gw.example")))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Fetch(_)));
    assert_eq!(fetcher.requests(), vec!["http://localhost/app/cards/index.json"]);
}
