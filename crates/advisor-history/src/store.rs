//! History store implementations

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use advisor_core::{
    Error, HistoryEntry, HistoryPage, HistoryStore, Result, SourceDocumentRecord,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    entries: Vec<HistoryEntry>,
    sources: Vec<SourceDocumentRecord>,
    last_updated: Option<DateTime<Utc>>,
}

impl Ledger {
    fn append(&mut self, entry: HistoryEntry, sources: Vec<SourceDocumentRecord>) {
        self.entries.push(entry);
        self.sources.extend(sources);
        self.last_updated = Some(Utc::now());
    }

    fn page(&self, limit: usize, offset: usize) -> HistoryPage {
        let items: Vec<HistoryEntry> = self
            .entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        HistoryPage {
            items,
            total_count: self.entries.len(),
            limit,
            offset,
        }
    }
}

/// In-memory append-only history store
pub struct MemoryHistoryStore {
    inner: Arc<RwLock<Ledger>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Ledger::default())),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: HistoryEntry, sources: Vec<SourceDocumentRecord>) -> Result<()> {
        let mut ledger = self
            .inner
            .write()
            .map_err(|e| Error::History(format!("lock error: {}", e)))?;
        ledger.append(entry, sources);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>> {
        let ledger = self
            .inner
            .read()
            .map_err(|e| Error::History(format!("lock error: {}", e)))?;
        Ok(ledger.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn sources_for(&self, id: Uuid) -> Result<Vec<SourceDocumentRecord>> {
        let ledger = self
            .inner
            .read()
            .map_err(|e| Error::History(format!("lock error: {}", e)))?;
        Ok(ledger
            .sources
            .iter()
            .filter(|s| s.query_id == id)
            .cloned()
            .collect())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        let ledger = self
            .inner
            .read()
            .map_err(|e| Error::History(format!("lock error: {}", e)))?;
        Ok(ledger.page(limit, offset))
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let ledger = self
            .inner
            .read()
            .map_err(|e| Error::History(format!("lock error: {}", e)))?;
        Ok(ledger.entries.clone())
    }
}

/// JSON-file-backed history store.
///
/// Loads the ledger on construction (an unreadable or malformed file
/// starts a fresh ledger rather than failing startup). Appends hold an
/// async write lock across the file rewrite, so each append lands as one
/// consistent snapshot and concurrent appends never write out of order.
pub struct FileHistoryStore {
    path: PathBuf,
    inner: tokio::sync::RwLock<Ledger>,
}

impl FileHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ledger = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "history file unreadable, starting fresh");
                Ledger::default()
            })
        } else {
            Ledger::default()
        };
        Ok(Self {
            path,
            inner: tokio::sync::RwLock::new(ledger),
        })
    }

    async fn save(&self, ledger: &Ledger) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn append(&self, entry: HistoryEntry, sources: Vec<SourceDocumentRecord>) -> Result<()> {
        let mut ledger = self.inner.write().await;
        ledger.append(entry, sources);
        self.save(&ledger).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<HistoryEntry>> {
        let ledger = self.inner.read().await;
        Ok(ledger.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn sources_for(&self, id: Uuid) -> Result<Vec<SourceDocumentRecord>> {
        let ledger = self.inner.read().await;
        Ok(ledger
            .sources
            .iter()
            .filter(|s| s.query_id == id)
            .cloned()
            .collect())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        let ledger = self.inner.read().await;
        Ok(ledger.page(limit, offset))
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let ledger = self.inner.read().await;
        Ok(ledger.entries.clone())
    }
}
