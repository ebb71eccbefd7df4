// # Gotify Notifier
//
// Pushes feedherald announcements to a Gotify server.
//
// - POST `{url}/message` with header `X-Gotify-Key: <token>`
// - JSON body `{"title": "feedherald", "message": <text>, "priority": <p>}`
// - Any non-2xx response is a failure
//
// The application token never appears in logs or Debug output.

use async_trait::async_trait;
use feedherald_core::config::{DEFAULT_HTTP_TIMEOUT_SECS, NotifierConfig};
use feedherald_core::traits::{Notifier, NotifierFactory};
use feedherald_core::{ComponentRegistry, Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Title attached to every message
const MESSAGE_TITLE: &str = "feedherald";

/// Header carrying the application token
const TOKEN_HEADER: &str = "X-Gotify-Key";

#[derive(Debug, Serialize)]
struct Message<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Gotify push notifier
pub struct GotifyNotifier {
    endpoint: String,
    token: String,
    priority: u8,
    client: reqwest::Client,
}

impl std::fmt::Debug for GotifyNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GotifyNotifier")
            .field("endpoint", &self.endpoint)
            .field("token", &"<REDACTED>")
            .field("priority", &self.priority)
            .finish()
    }
}

impl GotifyNotifier {
    /// Create a new Gotify notifier
    ///
    /// # Parameters
    ///
    /// - `server_url`: Gotify base URL (e.g., "https://push.example")
    /// - `token`: Application token
    /// - `priority`: Message priority
    pub fn new(server_url: &str, token: impl Into<String>, priority: u8) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("Gotify token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/message", server_url.trim_end_matches('/')),
            token,
            priority,
            client,
        })
    }

    /// The message endpoint this notifier posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for GotifyNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let message = Message {
            title: MESSAGE_TITLE,
            message: text,
            priority: self.priority,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(TOKEN_HEADER, &self.token)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::notify(format!("Gotify request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::notify(format!(
                "Gotify push failed: {} - {}",
                status, error_text
            )));
        }

        tracing::debug!("Pushed message to Gotify");
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "gotify"
    }
}

/// Factory for creating Gotify notifiers
pub struct GotifyFactory;

impl NotifierFactory for GotifyFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Gotify {
                url,
                token,
                priority,
            } => {
                if url.is_empty() {
                    return Err(Error::config("Gotify URL is required"));
                }
                Ok(Box::new(GotifyNotifier::new(url, token.clone(), *priority)?))
            }
            _ => Err(Error::config("Invalid config for Gotify notifier")),
        }
    }
}

/// Register the Gotify notifier with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_notifier("gotify", Box::new(GotifyFactory));
}
