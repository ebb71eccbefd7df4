// # Notifier Trait
//
// Defines the interface for announcing a post to an external messaging
// endpoint.
//
// ## Implementations
//
// - Mastodon: `feedherald-notifier-mastodon` crate
// - Gotify: `feedherald-notifier-gotify` crate

use async_trait::async_trait;

/// Trait for notifier implementations
///
/// The engine renders the text; the notifier only delivers it.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed post is retried on the next poll cycle)
/// - ❌ Access the history store (owned by `FeedEngine`)
/// - ❌ Decide whether an item needs announcing (owned by the classifier)
///
/// ## Why No Retry Logic?
///
/// History is committed only after `notify` returns `Ok`. Any failure leaves
/// the item unrecorded, so the next cycle classifies it the same way and
/// tries again. Retrying here as well would multiply the request rate and
/// stall the rest of the cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The endpoint accepted the message
    /// - `Err(Error)`: Any failure; the reason is logged but not interpreted
    async fn notify(&self, text: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a Notifier instance from configuration
    fn create(
        &self,
        config: &crate::config::NotifierConfig,
    ) -> Result<Box<dyn Notifier>, crate::Error>;
}
