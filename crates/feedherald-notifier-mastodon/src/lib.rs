// # Mastodon Notifier
//
// This crate posts feedherald announcements as Mastodon statuses.
//
// ## Behavior
//
// - One POST per notify() call, no retries (the engine retries next cycle)
// - Any non-2xx response is a failure; history is then left untouched
// - The access token never appears in logs or Debug output
//
// ## API Reference
//
// - Post a status: POST `/api/v1/statuses`
//   - Authorization: Bearer <token>
//   - Form body: `status=<text>` and optionally `visibility=<v>`

use async_trait::async_trait;
use feedherald_core::config::{DEFAULT_HTTP_TIMEOUT_SECS, NotifierConfig};
use feedherald_core::traits::{Notifier, NotifierFactory};
use feedherald_core::{ComponentRegistry, Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Status endpoint path relative to the instance URL
const STATUSES_PATH: &str = "/api/v1/statuses";

/// Mastodon status poster
///
/// # Security
///
/// The Debug implementation does NOT expose the access token.
pub struct MastodonNotifier {
    /// Full statuses endpoint URL
    endpoint: String,

    /// OAuth access token
    /// ⚠️ NEVER log this value
    access_token: String,

    /// Status visibility; instance default when None
    visibility: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for MastodonNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonNotifier")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"<REDACTED>")
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// The part of the created status we log
#[derive(Debug, Deserialize)]
struct StatusResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

impl MastodonNotifier {
    /// Create a new Mastodon notifier
    ///
    /// # Parameters
    ///
    /// - `instance_url`: Instance base URL (e.g., "https://mastodon.social")
    /// - `access_token`: Token with the `write:statuses` scope
    /// - `visibility`: Optional status visibility
    pub fn new(
        instance_url: &str,
        access_token: impl Into<String>,
        visibility: Option<String>,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Error::config("Mastodon access token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}{}", instance_url.trim_end_matches('/'), STATUSES_PATH),
            access_token,
            visibility,
            client,
        })
    }

    /// The statuses endpoint this notifier posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form<'a>(&'a self, text: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![("status", text)];
        if let Some(visibility) = &self.visibility {
            form.push(("visibility", visibility.as_str()));
        }
        form
    }
}

#[async_trait]
impl Notifier for MastodonNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .form(&self.form(text))
            .send()
            .await
            .map_err(|e| Error::notify(format!("Mastodon request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(match status.as_u16() {
                401 | 403 => Error::notify(format!(
                    "Mastodon rejected the access token. Status: {}",
                    status
                )),
                422 => Error::notify(format!("Mastodon rejected the status: {}", error_text)),
                429 => Error::notify(format!("Mastodon rate limit exceeded. Status: {}", status)),
                _ => Error::notify(format!(
                    "Mastodon post failed: {} - {}",
                    status, error_text
                )),
            });
        }

        // The status is posted; a body we cannot read changes nothing
        match response.json::<StatusResponse>().await {
            Ok(created) => tracing::debug!(
                "Posted status {} ({})",
                created.id,
                created.url.as_deref().unwrap_or("no url")
            ),
            Err(e) => tracing::debug!("Posted status, response not parsed: {}", e),
        }

        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "mastodon"
    }
}

/// Factory for creating Mastodon notifiers
pub struct MastodonFactory;

impl NotifierFactory for MastodonFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Mastodon {
                url,
                access_token,
                visibility,
            } => {
                if url.is_empty() {
                    return Err(Error::config("Mastodon URL is required"));
                }
                Ok(Box::new(MastodonNotifier::new(
                    url,
                    access_token.clone(),
                    visibility.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for Mastodon notifier")),
        }
    }
}

/// Register the Mastodon notifier with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_notifier("mastodon", Box::new(MastodonFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with a canned response and hand back the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn posts_status_form_with_bearer_token() {
        let (url, request) = serve_once("200 OK", r#"{"id":"1","url":"https://m/1"}"#).await;
        let notifier =
            MastodonNotifier::new(&url, "secret-token", Some("unlisted".to_string())).unwrap();

        notifier
            .notify("New blog post: https://blog/a b")
            .await
            .unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with("POST /api/v1/statuses HTTP/1.1"));
        assert!(request.contains("authorization: Bearer secret-token")
            || request.contains("Authorization: Bearer secret-token"));
        assert!(request.contains("status=New+blog+post%3A+https%3A%2F%2Fblog%2Fa+b"));
        assert!(request.contains("visibility=unlisted"));
    }

    #[tokio::test]
    async fn rejected_post_is_notify_error() {
        let (url, _request) = serve_once("401 Unauthorized", r#"{"error":"bad token"}"#).await;
        let notifier = MastodonNotifier::new(&url, "wrong", None).unwrap();

        let err = notifier.notify("hello").await.unwrap_err();
        assert!(matches!(err, Error::Notify(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn unreadable_success_body_still_succeeds() {
        let (url, _request) = serve_once("200 OK", "not json").await;
        let notifier = MastodonNotifier::new(&url, "token", None).unwrap();

        notifier.notify("hello").await.unwrap();
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let notifier = MastodonNotifier::new("https://m.example/", "token", None).unwrap();
        assert_eq!(notifier.endpoint(), "https://m.example/api/v1/statuses");
    }

    #[test]
    fn debug_hides_token() {
        let notifier = MastodonNotifier::new("https://m.example", "secret-token", None).unwrap();
        let rendered = format!("{:?}", notifier);
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn test_factory_creation() {
        let factory = MastodonFactory;

        let config = NotifierConfig::Mastodon {
            url: "https://m.example".to_string(),
            access_token: "test_token".to_string(),
            visibility: None,
        };
        let notifier = factory.create(&config).unwrap();
        assert_eq!(notifier.notifier_name(), "mastodon");
    }

    #[test]
    fn test_factory_missing_token() {
        let factory = MastodonFactory;

        let config = NotifierConfig::Mastodon {
            url: "https://m.example".to_string(),
            access_token: "".to_string(),
            visibility: None,
        };
        assert!(factory.create(&config).is_err());
    }

    #[test]
    fn test_register() {
        let registry = ComponentRegistry::new();
        register(&registry);
        assert!(registry.has_notifier("mastodon"));
    }
}
