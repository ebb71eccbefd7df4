// # History Store Implementations
//
// This module provides implementations of the HistoryStore trait for
// different persistence strategies.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryHistoryStore;
pub use sqlite::{DEFAULT_HISTORY_PATH, HISTORY_TABLE, SqliteHistoryStore};

use crate::config::HistoryStoreConfig;
use crate::error::Result;
use crate::traits::HistoryStore;

/// Open the history store described by the configuration
///
/// Any failure is `Error::StorageUnavailable`, which callers treat as fatal.
pub async fn open(config: &HistoryStoreConfig) -> Result<Box<dyn HistoryStore>> {
    match config {
        HistoryStoreConfig::Sqlite { path } => {
            let store = SqliteHistoryStore::open(path).await?;
            Ok(Box::new(store))
        }
        HistoryStoreConfig::Memory => {
            tracing::warn!("Using in-memory history: every restart re-announces the whole feed");
            Ok(Box::new(MemoryHistoryStore::new()))
        }
    }
}
