//! Plugin-based component registry
//!
//! The registry allows feed sources and notifiers to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feedherald_core::registry::ComponentRegistry;
//!
//! let registry = ComponentRegistry::new();
//! feedherald_source_http::register(&registry);
//! feedherald_notifier_mastodon::register(&registry);
//!
//! let source = registry.create_source(&config.source)?;
//! let notifier = registry.create_notifier(&config.notifier)?;
//! ```
//!
//! History stores are not registered here: opening one is async and its
//! failure is fatal, see [`crate::history::open`].

use crate::config::{FeedSourceConfig, NotifierConfig};
use crate::error::{Error, Result};
use crate::traits::{FeedSource, FeedSourceFactory, Notifier, NotifierFactory};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry mapping type names to component factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    sources: RwLock<HashMap<String, Box<dyn FeedSourceFactory>>>,
    notifiers: RwLock<HashMap<String, Box<dyn NotifierFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feed source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "http")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn FeedSourceFactory>) {
        write(&self.sources).insert(name.into(), factory);
    }

    /// Register a notifier factory
    ///
    /// # Parameters
    ///
    /// - `name`: Notifier type name (e.g., "mastodon", "gotify")
    /// - `factory`: Factory object for creating notifier instances
    pub fn register_notifier(&self, name: impl Into<String>, factory: Box<dyn NotifierFactory>) {
        write(&self.notifiers).insert(name.into(), factory);
    }

    /// Create a feed source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn FeedSource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &FeedSourceConfig) -> Result<Box<dyn FeedSource>> {
        let source_type = config.type_name();
        let sources = read(&self.sources);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown feed source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create a notifier from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Notifier>)`: Created notifier instance
    /// - `Err(Error)`: If the notifier type is not registered or creation fails
    pub fn create_notifier(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        let notifier_type = config.type_name();
        let notifiers = read(&self.notifiers);

        let factory = notifiers
            .get(notifier_type)
            .ok_or_else(|| Error::config(format!("Unknown notifier type: {}", notifier_type)))?;

        factory.create(config)
    }

    /// List all registered source types, sorted
    pub fn list_sources(&self) -> Vec<String> {
        sorted_keys(&read(&self.sources))
    }

    /// List all registered notifier types, sorted
    pub fn list_notifiers(&self) -> Vec<String> {
        sorted_keys(&read(&self.notifiers))
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        read(&self.sources).contains_key(name)
    }

    /// Check if a notifier type is registered
    pub fn has_notifier(&self, name: &str) -> bool {
        read(&self.notifiers).contains_key(name)
    }
}

// Factories are plain values; a poisoned map is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
