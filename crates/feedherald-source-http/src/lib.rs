// # HTTP RSS Source
//
// This crate provides the RSS 2.0 feed source for feedherald.
//
// ## Behavior
//
// One GET per fetch() call, bounded by a request timeout. The whole channel
// is parsed and every <item> becomes an Item:
//
// - <title>       -> title
// - <link>        -> link (identity)
// - <description> -> body (fingerprinted)
//
// A missing element becomes the empty string. Items without a link are
// returned as-is; the engine decides what to do with them.
//
// No caching and no retries: a failed fetch is retried by the engine on
// its next cycle.

use async_trait::async_trait;
use feedherald_core::ComponentRegistry;
use feedherald_core::config::FeedSourceConfig;
use feedherald_core::traits::{FeedSource, FeedSourceFactory, Item};
use feedherald_core::{Error, Result};
use std::time::Duration;

/// RSS feed fetched over HTTP
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    /// Feed URL
    url: String,

    /// HTTP client with the request timeout applied
    client: reqwest::Client,
}

impl HttpFeedSource {
    /// Create a new HTTP feed source
    ///
    /// # Parameters
    ///
    /// - `url`: Feed URL (e.g., "https://blog.example/index.xml")
    /// - `timeout`: Upper bound for the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedherald/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// The feed URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Map an already-parsed channel to items, in feed order
    ///
    /// Pure: no I/O, so parsing can be tested without a server.
    pub fn parse_channel(channel: &rss::Channel) -> Vec<Item> {
        channel
            .items()
            .iter()
            .map(|item| {
                Item::new(
                    item.title().unwrap_or_default(),
                    item.link().unwrap_or_default().trim(),
                    item.description().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Parse a raw RSS document
    pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Item>> {
        let channel = rss::Channel::read_from(bytes)
            .map_err(|e| Error::feed_source(format!("Failed to parse feed: {}", e)))?;
        Ok(Self::parse_channel(&channel))
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        tracing::debug!("Fetching feed from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::feed_source(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::feed_source(format!(
                "Feed request to {} returned {}",
                self.url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::feed_source(format!("Failed to read response: {}", e)))?;

        let items = Self::parse_feed(&body)?;
        tracing::debug!("Parsed {} items from {}", items.len(), self.url);
        Ok(items)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP feed sources
pub struct HttpFeedSourceFactory;

impl FeedSourceFactory for HttpFeedSourceFactory {
    fn create(&self, config: &FeedSourceConfig) -> Result<Box<dyn FeedSource>> {
        match config {
            FeedSourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(Error::config("Feed URL is required"));
                }
                Ok(Box::new(HttpFeedSource::new(
                    url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?))
            }
            _ => Err(Error::config("Invalid config for HTTP feed source")),
        }
    }
}

/// Register the HTTP feed source with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("http", Box::new(HttpFeedSourceFactory));
}
