//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that let the contract tests
//! script the feed, observe announcements and inject storage failures.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedherald_core::config::{FeedSourceConfig, FeedheraldConfig, HistoryStoreConfig, NotifierConfig};
use feedherald_core::error::{Error, Result};
use feedherald_core::fingerprint::Fingerprint;
use feedherald_core::history::MemoryHistoryStore;
use feedherald_core::traits::{FeedSource, HistoryRecord, HistoryStore, Item, Notifier};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A feed source whose items the test can replace between cycles
#[derive(Clone, Default)]
pub struct ScriptedFeedSource {
    items: Arc<Mutex<Vec<Item>>>,
    fail: Arc<AtomicBool>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedFeedSource {
    pub fn new(items: Vec<Item>) -> Self {
        let source = Self::default();
        source.set_items(items);
        source
    }

    /// Replace what the next fetch returns
    pub fn set_items(&self, items: Vec<Item>) {
        *self.items.lock().unwrap() = items;
    }

    /// Make fetches fail until reset
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of fetch() calls so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeedSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::feed_source("scripted fetch failure"));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records every attempted announcement
#[derive(Clone, Default)]
pub struct CountingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    attempts: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notify() fail until reset
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Texts that were delivered successfully
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of notify() calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notify("scripted notify failure"));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "counting"
    }
}

/// A history store with switchable lookup and upsert failures
///
/// Delegates to a shared [`MemoryHistoryStore`] when not failing.
#[derive(Clone, Default)]
pub struct FaultyHistoryStore {
    inner: MemoryHistoryStore,
    fail_lookup: Arc<AtomicBool>,
    fail_upsert: Arc<AtomicBool>,
    upsert_count: Arc<AtomicUsize>,
    close_count: Arc<AtomicUsize>,
}

impl FaultyHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lookup_failing(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn set_upsert_failing(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    /// Number of upsert() calls that reached the store
    pub fn upsert_count(&self) -> usize {
        self.upsert_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// The records as they stand
    pub fn memory(&self) -> &MemoryHistoryStore {
        &self.inner
    }
}

#[async_trait]
impl HistoryStore for FaultyHistoryStore {
    async fn lookup(&self, link: &str) -> Result<Option<HistoryRecord>> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(Error::storage_io("scripted lookup failure"));
        }
        self.inner.lookup(link).await
    }

    async fn upsert(&self, link: &str, fingerprint: &Fingerprint, at: DateTime<Utc>) -> Result<()> {
        self.upsert_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(Error::storage_io("scripted upsert failure"));
        }
        self.inner.upsert(link, fingerprint, at).await
    }

    async fn list_links(&self) -> Result<Vec<String>> {
        self.inner.list_links().await
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Helper to create a minimal FeedheraldConfig for testing
pub fn minimal_config() -> FeedheraldConfig {
    let mut config = FeedheraldConfig::new(
        FeedSourceConfig::Custom {
            factory: "scripted".to_string(),
            config: serde_json::json!({}),
        },
        NotifierConfig::Custom {
            factory: "counting".to_string(),
            config: serde_json::json!({}),
        },
    );
    config.history = HistoryStoreConfig::Memory;
    config.poll.event_channel_capacity = 100;
    config
}

/// Config with a poll interval short enough to see several cycles in a test
pub fn fast_config(interval_secs: u64) -> FeedheraldConfig {
    let mut config = minimal_config();
    config.poll.interval_secs = interval_secs;
    config
}
