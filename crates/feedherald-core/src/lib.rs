// # feedherald-core
//
// Core library for the feedherald feed announcer.
//
// ## Architecture Overview
//
// This library decides which feed items deserve an announcement:
// - **FeedSource**: Trait for fetching the current list of feed items
// - **Notifier**: Trait for sending an announcement
// - **HistoryStore**: Trait for the durable link → fingerprint record
// - **classifier**: NEW / UPDATED / UNCHANGED decision for one item
// - **FeedEngine**: Poll loop that fetches, classifies, announces and commits
// - **ComponentRegistry**: Plugin-based registry for sources and notifiers
//
// ## Design Principles
//
// 1. **Commit after success**: history changes only once the announcement went out
// 2. **Plugin-Based**: Sources and notifiers are registered dynamically
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: An unchanged item is never announced twice

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod history;
pub mod registry;
pub mod render;
pub mod traits;

// Re-export core types for convenience
pub use classifier::{Classification, Decision, classify};
pub use config::{FeedSourceConfig, FeedheraldConfig, HistoryStoreConfig, NotifierConfig, PollConfig};
pub use engine::{CycleReport, EngineEvent, FeedEngine};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint};
pub use history::{MemoryHistoryStore, SqliteHistoryStore};
pub use registry::ComponentRegistry;
pub use traits::{FeedSource, HistoryRecord, HistoryStore, Item, Notifier};
