// # History Store Trait
//
// Defines the interface for the durable record of announced posts.
//
// ## Purpose
//
// The history store ensures posts are announced once by tracking, per link:
// - The fingerprint of the body as last announced
// - When it was last announced
//
// A record exists iff the item was announced successfully at least once.
//
// ## Implementations
//
// - SQLite: `tooted_posts` table, survives restarts
// - Memory: tests and throwaway runs

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::fingerprint::Fingerprint;

/// Last announced state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Item permalink (primary key)
    pub link: String,
    /// Fingerprint of the body as announced
    ///
    /// `None` when the stored hash cannot be decoded. Such a record matches
    /// no item, so the next announcement rewrites it.
    pub fingerprint: Option<Fingerprint>,
    /// When the announcement was committed, if the stored value is readable
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    /// Create a new history record
    pub fn new(link: impl Into<String>, fingerprint: Fingerprint, last_seen_at: DateTime<Utc>) -> Self {
        Self {
            link: link.into(),
            fingerprint: Some(fingerprint),
            last_seen_at: Some(last_seen_at),
        }
    }

    /// Whether the recorded fingerprint equals `current`
    pub fn matches(&self, current: &Fingerprint) -> bool {
        self.fingerprint.as_ref() == Some(current)
    }
}

/// Render a timestamp the way it is persisted
///
/// RFC 3339, UTC, second precision, so lexical order is chronological.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a persisted timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, crate::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| crate::Error::storage_io(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Trait for history store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform local I/O for persistent storage
/// - ✅ Serialize writers with a lock
///
/// ## Forbidden Capabilities
/// - ❌ Decide whether an item is new or changed (owned by the classifier)
/// - ❌ Delete or expire records
/// - ❌ Spawn background tasks without clear lifecycle
///
/// ## Implementation Guidelines
///
/// - **Not found is not an error**: `lookup` returns `Ok(None)`
/// - **Insert or replace**: `upsert` on an existing key overwrites it
/// - **Close is final**: every operation after `close` fails with `StorageIo`
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Get the record for a link
    ///
    /// # Returns
    ///
    /// - `Ok(Some(HistoryRecord))`: The item was announced before
    /// - `Ok(None)`: Never announced
    /// - `Err(Error)`: Read failure (`Error::StorageIo`)
    async fn lookup(&self, link: &str) -> Result<Option<HistoryRecord>, crate::Error>;

    /// Insert or replace the record for a link
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Durably written
    /// - `Err(Error)`: Write failure (`Error::StorageIo`)
    async fn upsert(
        &self,
        link: &str,
        fingerprint: &Fingerprint,
        at: DateTime<Utc>,
    ) -> Result<(), crate::Error>;

    /// List every link with a record
    async fn list_links(&self) -> Result<Vec<String>, crate::Error>;

    /// Release the backing resource
    ///
    /// Idempotent. Must be called on every exit path of the owner.
    async fn close(&self) -> Result<(), crate::Error>;
}
