//! Shared fixtures for the import integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dcard_core::Card;
use dcard_crypto::{
    sign_card, KeyProvider, LocalKeyProvider, SignatureVerifier, TrustRegistry, TrustedKey,
};
use dcard_import::{CardVerifier, DocumentFetcher, FetchError};
use serde_json::Value;
use url::Url;

pub const KEY_ID: &str = "issuer-test";

/// A fetcher serving canned documents and recording every requested URL.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Value) -> Self {
        let key = Url::parse(url).unwrap().to_string();
        self.responses.insert(key, body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            })
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn issuer() -> LocalKeyProvider {
    LocalKeyProvider::from_seed(&[99u8; 32])
}

pub fn registry() -> Arc<TrustRegistry> {
    Arc::new(TrustRegistry::from_entries([(
        KEY_ID,
        TrustedKey::new("Test Issuer", &issuer().public_key()),
    )]))
}

pub fn card_verifier(strict: bool) -> CardVerifier {
    CardVerifier::new(SignatureVerifier::new(registry()), strict)
}

/// A card signed by [`issuer`] under `key_id`, as JSON.
pub fn signed_card(value: Value, key_id: &str) -> Value {
    let mut card = Card::from_value(value).unwrap();
    sign_card(&mut card, key_id, &issuer()).unwrap();
    card.into_value()
}
