//! Snapshot Storage
//!
//! A single slot holding the last successful search. Each successful search
//! overwrites it in full; it is read once at startup and by "go to first
//! page". Failures come back as [`StoreError`] so callers can decide whether
//! a degraded mode is worth surfacing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::api::coerce_count;
use crate::models::{ArticleSummary, HistoryToken};

const SNAPSHOT_FILE: &str = "last_search.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("stored snapshot is unreadable: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("snapshot slot unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Serialized projection of a search session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub term: String,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub webenv: Option<String>,
    #[serde(default)]
    pub query_key: Option<String>,
    #[serde(default, alias = "articles")]
    pub results: Vec<ArticleSummary>,
    #[serde(default, alias = "count", deserialize_with = "lenient_count")]
    pub total_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn first_page() -> u32 {
    1
}

// Older snapshots stored the raw wire count, which may be a string.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

impl Snapshot {
    pub fn history_token(&self) -> Option<HistoryToken> {
        HistoryToken::from_parts(self.webenv.clone(), self.query_key.clone())
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(StoreError::Serialize)
    }

    pub fn from_json(raw: &str) -> StoreResult<Self> {
        serde_json::from_str(raw).map_err(StoreError::Parse)
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when the slot is empty.
    async fn restore(&self) -> StoreResult<Option<Snapshot>>;

    /// Overwrite the slot.
    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()>;

    async fn clear(&self) -> StoreResult<()>;
}

/// JSON file under a per-profile directory.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn restore(&self) -> StoreResult<Option<Snapshot>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = Snapshot::from_json(&raw)?;
        info!(path = ?self.path, term = %snapshot.term, page = snapshot.page, "Restored snapshot");
        Ok(Some(snapshot))
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        self.ensure_dir().await?;
        let content = snapshot.to_json()?;

        // Write then rename so a crash never leaves a half-written slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = ?self.path, term = %snapshot.term, page = snapshot.page, "Saved snapshot");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-lifetime slot. Holds the serialized form so parse failures behave
/// exactly like the file store.
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw content, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| StoreError::Unavailable("slot lock poisoned".to_string()))
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn restore(&self) -> StoreResult<Option<Snapshot>> {
        let raw = self.lock()?.clone();
        raw.as_deref().map(Snapshot::from_json).transpose()
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let content = snapshot.to_json()?;
        *self.lock()? = Some(content);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    async fn restore(&self) -> StoreResult<Option<Snapshot>> {
        (**self).restore().await
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        (**self).persist(snapshot).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }
}
