//! Core traits for feedherald
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`FeedSource`]: Fetch the current feed snapshot
//! - [`Notifier`]: Deliver an announcement
//! - [`HistoryStore`]: Durable record of what was announced

pub mod feed_source;
pub mod history_store;
pub mod notifier;

pub use feed_source::{FeedSource, FeedSourceFactory, Item};
pub use history_store::{HistoryRecord, HistoryStore};
pub use notifier::{Notifier, NotifierFactory};
