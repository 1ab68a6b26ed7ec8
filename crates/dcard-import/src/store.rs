//! # Card Stores
//!
//! Persistence for imported cards, keyed by fingerprint. Writes to the same
//! fingerprint replace the previous record.
//!
//! - [`InMemoryCardStore`]: a `DashMap`, for tests and embedding hosts.
//! - [`FsCardStore`]: one `<fingerprint>.json` file per card. Each save
//!   writes its own temporary file and renames it into place, so concurrent
//!   saves of one fingerprint leave exactly one complete record. Records are
//!   re-checked against their fingerprint when read back; `list` skips
//!   records that fail the check.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dcard_core::{compute_fingerprint, Card, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::verify::VerificationResult;

/// A persisted card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCard {
    /// Store key.
    pub fingerprint: Fingerprint,
    /// The card as imported, with its fingerprint attached.
    pub document: Card,
    /// Verdict was `verified`.
    pub verified: bool,
    /// Verdict was `unsigned`.
    pub unsigned: bool,
    /// When the card was added.
    pub added_at: DateTime<Utc>,
}

impl StoredCard {
    /// A record for a verified card, stamped with the current time.
    pub fn new(document: Card, verdict: &VerificationResult) -> Self {
        Self {
            fingerprint: verdict.fingerprint.clone(),
            document,
            verified: verdict.verified,
            unsigned: verdict.unsigned,
            added_at: Utc::now(),
        }
    }
}

/// Get/put-by-fingerprint persistence.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Insert or replace the record for `record.fingerprint`.
    async fn save(&self, record: StoredCard) -> Result<(), StoreError>;

    /// Fetch a record by fingerprint.
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<StoredCard>, StoreError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<StoredCard>, StoreError>;
}

// ─── InMemoryCardStore ───────────────────────────────────────────────────

/// In-memory [`CardStore`].
#[derive(Debug, Default)]
pub struct InMemoryCardStore {
    cards: DashMap<Fingerprint, StoredCard>,
}

impl InMemoryCardStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn save(&self, record: StoredCard) -> Result<(), StoreError> {
        self.cards.insert(record.fingerprint.clone(), record);
        Ok(())
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<StoredCard>, StoreError> {
        Ok(self.cards.get(fingerprint).map(|r| r.value().clone()))
    }

    async fn list(&self) -> Result<Vec<StoredCard>, StoreError> {
        let mut records: Vec<StoredCard> = self.cards.iter().map(|r| r.value().clone()).collect();
        sort_oldest_first(&mut records);
        Ok(records)
    }
}

// ─── FsCardStore ─────────────────────────────────────────────────────────

/// Filesystem [`CardStore`].
///
/// The directory is created on the first save.
#[derive(Debug, Clone)]
pub struct FsCardStore {
    root: PathBuf,
}

impl FsCardStore {
    /// A store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `fingerprint`.
    pub fn record_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{fingerprint}.json"))
    }

    async fn read_record(&self, path: &Path) -> Result<StoredCard, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        let record: StoredCard = serde_json::from_slice(&bytes)?;
        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.display().to_string(),
            reason,
        };

        let expected_name = format!("{}.json", record.fingerprint);
        if path.file_name().and_then(|n| n.to_str()) != Some(expected_name.as_str()) {
            return Err(corrupt(format!(
                "file name does not match fingerprint {}",
                record.fingerprint
            )));
        }
        let computed = compute_fingerprint(&record.document)
            .map_err(|e| corrupt(e.to_string()))?
            .fingerprint;
        if computed != record.fingerprint {
            return Err(corrupt(format!("document hashes to {computed}")));
        }
        Ok(record)
    }
}

#[async_trait]
impl CardStore for FsCardStore {
    async fn save(&self, record: StoredCard) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.record_path(&record.fingerprint);
        let bytes = serde_json::to_vec_pretty(&record)?;

        let root = self.root.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        tracing::debug!(path = %path.display(), "card record written");
        Ok(())
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<StoredCard>, StoreError> {
        let path = self.record_path(fingerprint);
        match tokio::fs::metadata(&path).await {
            Ok(_) => self.read_record(&path).await.map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<StoredCard>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable card record: {e}")
                }
            }
        }
        sort_oldest_first(&mut records);
        Ok(records)
    }
}

fn sort_oldest_first(records: &mut [StoredCard]) {
    records.sort_by(|a, b| {
        a.added_at
            .cmp(&b.added_at)
            .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });
}
