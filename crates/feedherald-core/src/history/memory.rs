// # Memory History Store
//
// In-memory implementation of HistoryStore.
//
// ## Crash Behavior
//
// - All history is lost on restart
// - The first cycle after a restart announces every item in the feed again
//
// ## When to Use
//
// - Tests
// - Dry runs against a feed where re-announcing is harmless

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::fingerprint::Fingerprint;
use crate::traits::history_store::{HistoryRecord, HistoryStore};

/// In-memory history store
///
/// Clones share the same records, which lets a test keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    inner: Arc<RwLock<HashMap<String, HistoryRecord>>>,
    closed: Arc<AtomicBool>,
}

impl MemoryHistoryStore {
    /// Create a new empty memory history store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::storage_io("History store is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn lookup(&self, link: &str) -> Result<Option<HistoryRecord>, Error> {
        self.ensure_open()?;
        let guard = self.inner.read().await;
        Ok(guard.get(link).cloned())
    }

    async fn upsert(
        &self,
        link: &str,
        fingerprint: &Fingerprint,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        let mut guard = self.inner.write().await;
        guard.insert(link.to_string(), HistoryRecord::new(link, *fingerprint, at));
        Ok(())
    }

    async fn list_links(&self) -> Result<Vec<String>, Error> {
        self.ensure_open()?;
        let guard = self.inner.read().await;
        let mut links: Vec<String> = guard.keys().cloned().collect();
        links.sort();
        Ok(links)
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryHistoryStore::new();
        assert!(store.is_empty().await);

        let now = Utc::now();
        store
            .upsert("https://x/1", &fingerprint("hello"), now)
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let record = store.lookup("https://x/1").await.unwrap().unwrap();
        assert_eq!(record.fingerprint, Some(fingerprint("hello")));
        assert_eq!(record.last_seen_at, Some(now));
        assert_eq!(store.lookup("https://x/2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_records() {
        let store = MemoryHistoryStore::new();
        let handle = store.clone();

        store
            .upsert("https://x/1", &fingerprint("a"), Utc::now())
            .await
            .unwrap();
        store
            .upsert("https://x/1", &fingerprint("b"), Utc::now())
            .await
            .unwrap();

        assert_eq!(handle.len().await, 1);
        let record = handle.lookup("https://x/1").await.unwrap().unwrap();
        assert_eq!(record.fingerprint, Some(fingerprint("b")));
    }

    #[tokio::test]
    async fn test_memory_store_close() {
        let store = MemoryHistoryStore::new();
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert!(matches!(
            store.lookup("https://x/1").await,
            Err(Error::StorageIo(_))
        ));
    }
}
