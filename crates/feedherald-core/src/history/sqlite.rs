// # SQLite History Store
//
// Durable implementation of HistoryStore.
//
// ## Purpose
//
// Keeps the record of announced posts across daemon restarts, so a restart
// does not announce the whole feed again.
//
// ## Table Layout
//
// ```sql
// CREATE TABLE IF NOT EXISTS tooted_posts (
//     link TEXT PRIMARY KEY,
//     content_hash TEXT,
//     timestamp TEXT
// )
// ```
//
// `content_hash` is the lowercase hex SHA-256 of the item body and
// `timestamp` is RFC 3339 UTC (`2025-01-09T12:00:00Z`).
//
// ## Concurrency
//
// One connection behind a mutex: writers are serialized, and blocking
// SQLite calls run on the blocking thread pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs;

use crate::Error;
use crate::fingerprint::Fingerprint;
use crate::traits::history_store::{
    HistoryRecord, HistoryStore, format_timestamp, parse_timestamp,
};

/// Name of the history table
pub const HISTORY_TABLE: &str = "tooted_posts";

/// Default location of the history database
pub const DEFAULT_HISTORY_PATH: &str = "./tooted_posts.db";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS tooted_posts (
    link TEXT PRIMARY KEY,
    content_hash TEXT,
    timestamp TEXT
)";

const REQUIRED_COLUMNS: [&str; 3] = ["link", "content_hash", "timestamp"];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed history store
///
/// # Example
///
/// ```rust,no_run
/// use feedherald_core::fingerprint::fingerprint;
/// use feedherald_core::history::SqliteHistoryStore;
/// use feedherald_core::traits::HistoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteHistoryStore::open("./tooted_posts.db").await?;
///
///     store
///         .upsert("https://example.com/1", &fingerprint("hello"), chrono::Utc::now())
///         .await?;
///     assert!(store.lookup("https://example.com/1").await?.is_some());
///
///     store.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SqliteHistoryStore {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteHistoryStore {
    /// Open or create the history database
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Open (or create) the database file
    /// 3. Create the `tooted_posts` table if it does not exist
    /// 4. Check the table has the expected columns
    ///
    /// Calling it again on an initialized file only re-checks the schema.
    /// Every failure is reported as `Error::StorageUnavailable`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage_unavailable(format!(
                    "Failed to create history directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let open_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&open_path).map_err(|e| {
                Error::storage_unavailable(format!(
                    "Failed to open history database {}: {}",
                    open_path.display(),
                    e
                ))
            })?;
            Self::ensure_schema(&conn)?;
            Ok::<_, Error>(conn)
        })
        .await
        .map_err(|e| Error::storage_unavailable(format!("History open task failed: {}", e)))??;

        tracing::debug!("Opened history database: {}", path.display());

        Ok(Self {
            path: Some(path),
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Open a private in-memory database with the same schema
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| {
            Error::storage_unavailable(format!("Failed to open in-memory history: {}", e))
        })?;
        Self::ensure_schema(&conn)?;

        Ok(Self {
            path: None,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Path of the backing file (`None` for in-memory stores)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the table if missing, then check its columns
    fn ensure_schema(conn: &Connection) -> Result<(), Error> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::storage_unavailable(format!("Failed to set busy timeout: {}", e)))?;

        conn.execute_batch(CREATE_TABLE_SQL).map_err(|e| {
            Error::storage_unavailable(format!("Failed to create {} table: {}", HISTORY_TABLE, e))
        })?;

        let columns = Self::table_columns(conn).map_err(|e| {
            Error::storage_unavailable(format!("Failed to inspect {} table: {}", HISTORY_TABLE, e))
        })?;

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(Error::storage_unavailable(format!(
                    "Table {} is missing column '{}' (found: {})",
                    HISTORY_TABLE,
                    required,
                    columns.join(", ")
                )));
            }
        }

        Ok(())
    }

    fn table_columns(conn: &Connection) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let rows = stmt.query_map([HISTORY_TABLE], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    /// Run a blocking operation against the open connection
    async fn with_conn<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::storage_io("History connection lock poisoned"))?;
            let conn = guard
                .as_ref()
                .ok_or_else(|| Error::storage_io("History store is closed"))?;
            op(conn)
        })
        .await
        .map_err(|e| Error::storage_io(format!("History task failed: {}", e)))?
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn lookup(&self, link: &str) -> Result<Option<HistoryRecord>, Error> {
        let link = link.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT content_hash, timestamp FROM tooted_posts WHERE link = ?1",
                    params![link],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, Option<String>>(1)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| Error::storage_io(format!("Failed to read {}: {}", link, e)))?;

            let Some((hash, timestamp)) = row else {
                return Ok(None);
            };

            // A damaged row must not block its link: keep what is readable
            let fingerprint = match hash.as_deref().map(str::parse::<Fingerprint>) {
                Some(Ok(fp)) => Some(fp),
                _ => {
                    tracing::warn!("Unreadable content_hash for {}, treating as changed", link);
                    None
                }
            };
            let last_seen_at = match timestamp.as_deref().map(parse_timestamp) {
                Some(Ok(at)) => Some(at),
                _ => {
                    tracing::debug!("Unreadable timestamp for {}", link);
                    None
                }
            };

            Ok(Some(HistoryRecord {
                link,
                fingerprint,
                last_seen_at,
            }))
        })
        .await
    }

    async fn upsert(
        &self,
        link: &str,
        fingerprint: &Fingerprint,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let link = link.to_string();
        let hash = fingerprint.to_hex();
        let timestamp = format_timestamp(at);

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tooted_posts (link, content_hash, timestamp) VALUES (?1, ?2, ?3)",
                params![link, hash, timestamp],
            )
            .map_err(|e| Error::storage_io(format!("Failed to write {}: {}", link, e)))?;

            tracing::trace!("History committed: {} -> {}", link, hash);
            Ok(())
        })
        .await
    }

    async fn list_links(&self) -> Result<Vec<String>, Error> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT link FROM tooted_posts ORDER BY link")
                .map_err(|e| Error::storage_io(format!("Failed to list history: {}", e)))?;
            let links = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| Error::storage_io(format!("Failed to list history: {}", e)))?;
            Ok(links)
        })
        .await
    }

    async fn close(&self) -> Result<(), Error> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::storage_io("History connection lock poisoned"))?;

            match guard.take() {
                Some(conn) => conn
                    .close()
                    .map_err(|(_, e)| Error::storage_io(format!("Failed to close history: {}", e))),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| Error::storage_io(format!("History task failed: {}", e)))??;

        tracing::debug!("History store closed");
        Ok(())
    }
}
