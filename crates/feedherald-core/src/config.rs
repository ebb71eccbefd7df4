//! Configuration types for feedherald
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_PATH;
use crate::render::DEFAULT_INLINE_TITLE_PREFIX;

/// Default request timeout for outbound HTTP calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Main feedherald configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedheraldConfig {
    /// Feed source configuration
    pub source: FeedSourceConfig,

    /// Notifier configuration
    pub notifier: NotifierConfig,

    /// History store configuration
    #[serde(default)]
    pub history: HistoryStoreConfig,

    /// Poll loop settings
    #[serde(default)]
    pub poll: PollConfig,
}

impl FeedheraldConfig {
    /// Create a configuration from a source and a notifier, with defaults
    /// for everything else
    pub fn new(source: FeedSourceConfig, notifier: NotifierConfig) -> Self {
        Self {
            source,
            notifier,
            history: HistoryStoreConfig::default(),
            poll: PollConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.notifier.validate()?;
        self.history.validate()?;
        self.poll.validate()?;
        Ok(())
    }
}

/// Feed source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedSourceConfig {
    /// RSS feed fetched over HTTP
    Http {
        /// Feed URL
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_http_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom feed source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl FeedSourceConfig {
    /// HTTP source with the default timeout
    pub fn http(url: impl Into<String>) -> Self {
        FeedSourceConfig::Http {
            url: url.into(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    /// Validate the feed source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            FeedSourceConfig::Http { url, timeout_secs } => {
                validate_http_url("Feed", url)?;
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Feed request timeout must be > 0"));
                }
                Ok(())
            }
            FeedSourceConfig::Custom { factory, .. } => validate_factory("feed source", factory),
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            FeedSourceConfig::Http { .. } => "http",
            FeedSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Notifier configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Mastodon status poster
    Mastodon {
        /// Instance base URL (e.g. "https://mastodon.social")
        url: String,
        /// OAuth access token
        access_token: String,
        /// Status visibility ("public", "unlisted", "private", "direct")
        #[serde(default)]
        visibility: Option<String>,
    },

    /// Gotify push notifications
    Gotify {
        /// Server base URL
        url: String,
        /// Application token
        token: String,
        /// Message priority
        #[serde(default = "default_gotify_priority")]
        priority: u8,
    },

    /// Custom notifier
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::Mastodon {
                url,
                access_token,
                visibility,
            } => {
                validate_http_url("Mastodon", url)?;
                if access_token.is_empty() {
                    return Err(crate::Error::config("Mastodon access token cannot be empty"));
                }
                if let Some(v) = visibility
                    && !matches!(v.as_str(), "public" | "unlisted" | "private" | "direct")
                {
                    return Err(crate::Error::config(format!(
                        "Invalid Mastodon visibility: {}",
                        v
                    )));
                }
                Ok(())
            }
            NotifierConfig::Gotify { url, token, .. } => {
                validate_http_url("Gotify", url)?;
                if token.is_empty() {
                    return Err(crate::Error::config("Gotify token cannot be empty"));
                }
                Ok(())
            }
            NotifierConfig::Custom { factory, .. } => validate_factory("notifier", factory),
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Mastodon { .. } => "mastodon",
            NotifierConfig::Gotify { .. } => "gotify",
            NotifierConfig::Custom { factory, .. } => factory,
        }
    }
}

// Tokens must never reach logs.
impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierConfig::Mastodon {
                url, visibility, ..
            } => f
                .debug_struct("Mastodon")
                .field("url", url)
                .field("access_token", &"<redacted>")
                .field("visibility", visibility)
                .finish(),
            NotifierConfig::Gotify { url, priority, .. } => f
                .debug_struct("Gotify")
                .field("url", url)
                .field("token", &"<redacted>")
                .field("priority", priority)
                .finish(),
            NotifierConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<opaque>")
                .finish(),
        }
    }
}

/// History store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryStoreConfig {
    /// SQLite database file
    Sqlite {
        /// Path to the database file
        path: String,
    },

    /// In-memory history (not persistent)
    Memory,
}

impl HistoryStoreConfig {
    /// Validate the history store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            HistoryStoreConfig::Sqlite { path } if path.is_empty() => {
                Err(crate::Error::config("History database path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for HistoryStoreConfig {
    fn default() -> Self {
        HistoryStoreConfig::Sqlite {
            path: DEFAULT_HISTORY_PATH.to_string(),
        }
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between the end of one cycle and the start of the next
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Only process items whose link's last path segment contains this
    #[serde(default)]
    pub category: Option<String>,

    /// New posts with a title starting with this are announced with
    /// their full body
    #[serde(default = "default_inline_title_prefix")]
    pub inline_title_prefix: String,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl PollConfig {
    /// Validate the poll settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            category: None,
            inline_title_prefix: default_inline_title_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} URL cannot be empty", what)));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(crate::Error::config(format!(
            "{} URL must use http or https: {}",
            what, url
        )));
    }
    Ok(())
}

fn validate_factory(what: &str, factory: &str) -> Result<(), crate::Error> {
    if factory.is_empty() {
        return Err(crate::Error::config(format!(
            "Custom {} factory cannot be empty",
            what
        )));
    }
    Ok(())
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_gotify_priority() -> u8 {
    5
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_inline_title_prefix() -> String {
    DEFAULT_INLINE_TITLE_PREFIX.to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
