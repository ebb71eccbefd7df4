// # Feed Source Trait
//
// Defines the interface for retrieving the current snapshot of the feed.
//
// ## Implementations
//
// - HTTP + RSS 2.0: `feedherald-source-http` crate
//
// ## Usage
//
// ```rust,ignore
// use feedherald_core::FeedSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* FeedSource implementation */;
//
//     for item in source.fetch().await? {
//         println!("{} -> {}", item.title, item.link);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// One entry of the monitored feed
///
/// `link` is the identity of the item. The feed is assumed never to reuse a
/// permalink for a different post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Human-readable headline
    pub title: String,
    /// Permalink, the primary identity
    pub link: String,
    /// Raw description/content, the input to fingerprinting
    pub body: String,
}

impl Item {
    /// Create a new item
    pub fn new(title: impl Into<String>, link: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            body: body.into(),
        }
    }
}

/// Trait for feed source implementations
///
/// A source performs one fetch per call and returns the parsed items in
/// feed order. It does not remember what it returned last time; change
/// detection is owned by the engine and the history store.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP requests to the configured feed URL
/// - ✅ Parse the feed format
///
/// ## Forbidden Capabilities
/// - ❌ Access the history store (owned by `FeedEngine`)
/// - ❌ Retry or sleep (the engine re-polls on its own schedule)
/// - ❌ Filter or de-duplicate items (owned by `FeedEngine`)
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current feed snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Item>)`: The items, in feed order
    /// - `Err(Error)`: Transport or parse failure (`Error::FeedSource`)
    async fn fetch(&self) -> Result<Vec<Item>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing feed sources from configuration
pub trait FeedSourceFactory: Send + Sync {
    /// Create a FeedSource instance from configuration
    fn create(
        &self,
        config: &crate::config::FeedSourceConfig,
    ) -> Result<Box<dyn FeedSource>, crate::Error>;
}
