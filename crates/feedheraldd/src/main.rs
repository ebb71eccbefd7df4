// # feedheraldd - feed announcer daemon
//
// Thin integration layer. All change detection lives in feedherald-core.
//
// The daemon is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Registering the feed source and notifiers
// 4. Opening the history database (fatal if it cannot be opened)
// 5. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// Every flag has an environment fallback; flags win.
//
// ### Feed
// - `FEED_URL`: RSS feed to watch (required)
// - `INTERVAL`: Minutes between polls (default 60)
// - `CATEGORY`: Only announce links whose last path segment contains this
//
// ### Notifier
// - `NOTIFIER`: mastodon or gotify (default mastodon)
// - `MASTODON_URL`, `MASTODON_ACCESS_TOKEN`, `MASTODON_VISIBILITY`
// - `GOTIFY_URL`, `GOTIFY_TOKEN`, `GOTIFY_PRIORITY`
//
// ### History
// - `FEEDHERALD_DB_PATH`: SQLite file (default ./tooted_posts.db)
//
// ### Logging
// - `FEEDHERALD_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DEBUG`: shorthand for debug logging
//
// ## Example
//
// ```bash
// export FEED_URL=https://blog.example/index.xml
// export MASTODON_URL=https://mastodon.social
// export MASTODON_ACCESS_TOKEN=your_token
// export INTERVAL=30
//
// feedheraldd
// ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use feedherald_core::config::{
    DEFAULT_HTTP_TIMEOUT_SECS, FeedSourceConfig, FeedheraldConfig, HistoryStoreConfig,
    NotifierConfig, PollConfig,
};
use feedherald_core::engine::EngineEvent;
use feedherald_core::{ComponentRegistry, FeedEngine, history};
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: History database could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedheraldExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// History storage unavailable
    StorageUnavailable = 3,
}

impl From<FeedheraldExitCode> for ExitCode {
    fn from(code: FeedheraldExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl FeedheraldExitCode {
    /// Pick the exit code for a failure
    fn for_error(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<feedherald_core::Error>() {
            Some(feedherald_core::Error::StorageUnavailable(_)) => Self::StorageUnavailable,
            Some(feedherald_core::Error::Config(_)) => Self::ConfigError,
            _ => Self::RuntimeError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NotifierKind {
    Mastodon,
    Gotify,
}

/// Announce new and updated posts from an RSS feed
#[derive(Parser, Debug)]
#[command(name = "feedheraldd", version, about)]
struct Cli {
    /// RSS feed URL
    #[arg(long, env = "FEED_URL")]
    feed_url: Option<String>,

    /// Minutes between polls
    #[arg(long, env = "INTERVAL", default_value_t = 60)]
    interval: u64,

    /// Only announce links whose last path segment contains this
    #[arg(long, env = "CATEGORY")]
    category: Option<String>,

    /// Enable debug logging (accepts 1/0, true/false, yes/no, on/off)
    #[arg(long, env = "DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    debug: bool,

    /// Where announcements go
    #[arg(long, env = "NOTIFIER", value_enum, default_value_t = NotifierKind::Mastodon)]
    notifier: NotifierKind,

    /// Mastodon instance URL
    #[arg(long, env = "MASTODON_URL")]
    mastodon_url: Option<String>,

    /// Mastodon access token
    #[arg(long, env = "MASTODON_ACCESS_TOKEN", hide_env_values = true)]
    mastodon_access_token: Option<String>,

    /// Status visibility (public, unlisted, private, direct)
    #[arg(long, env = "MASTODON_VISIBILITY")]
    mastodon_visibility: Option<String>,

    /// Gotify server URL
    #[arg(long, env = "GOTIFY_URL")]
    gotify_url: Option<String>,

    /// Gotify application token
    #[arg(long, env = "GOTIFY_TOKEN", hide_env_values = true)]
    gotify_token: Option<String>,

    /// Gotify message priority
    #[arg(long, env = "GOTIFY_PRIORITY", default_value_t = 5)]
    gotify_priority: u8,

    /// History database file
    #[arg(long, env = "FEEDHERALD_DB_PATH", default_value = history::DEFAULT_HISTORY_PATH)]
    db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FEEDHERALD_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Turn flags into a validated engine configuration
    ///
    /// Error messages name the environment variable to set, since that is
    /// how the daemon is usually deployed.
    fn into_config(self) -> Result<FeedheraldConfig> {
        let feed_url = required(self.feed_url, "FEED_URL", "https://blog.example/index.xml")?;

        if self.interval == 0 {
            anyhow::bail!("INTERVAL must be at least 1 minute");
        }

        let notifier = match self.notifier {
            NotifierKind::Mastodon => {
                let access_token = required(
                    self.mastodon_access_token,
                    "MASTODON_ACCESS_TOKEN",
                    "your_token",
                )?;
                reject_placeholder("MASTODON_ACCESS_TOKEN", &access_token)?;
                NotifierConfig::Mastodon {
                    url: required(self.mastodon_url, "MASTODON_URL", "https://mastodon.social")?,
                    access_token,
                    visibility: self.mastodon_visibility.filter(|v| !v.is_empty()),
                }
            }
            NotifierKind::Gotify => {
                let token = required(self.gotify_token, "GOTIFY_TOKEN", "your_token")?;
                reject_placeholder("GOTIFY_TOKEN", &token)?;
                NotifierConfig::Gotify {
                    url: required(self.gotify_url, "GOTIFY_URL", "https://push.example")?,
                    token,
                    priority: self.gotify_priority,
                }
            }
        };

        let config = FeedheraldConfig {
            source: FeedSourceConfig::Http {
                url: feed_url,
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            notifier,
            history: HistoryStoreConfig::Sqlite { path: self.db_path },
            poll: PollConfig {
                interval_secs: self.interval.saturating_mul(60),
                category: self.category.filter(|c| !c.is_empty()),
                ..PollConfig::default()
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective log level
    fn log_level(&self) -> Result<Level> {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "FEEDHERALD_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        };

        Ok(if self.debug { Level::DEBUG } else { level })
    }
}

fn required(value: Option<String>, var: &str, example: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => anyhow::bail!("{} is required. Set it via: export {}={}", var, var, example),
    }
}

/// Catch tokens copied straight from documentation
fn reject_placeholder(var: &str, token: &str) -> Result<()> {
    let lower = token.to_lowercase();
    if lower.contains("your_token") || lower.contains("replace_me") || lower == "token" {
        anyhow::bail!(
            "{} appears to be a placeholder. Use the token issued by your server.",
            var
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return FeedheraldExitCode::ConfigError.into();
        }
    };

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return FeedheraldExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FeedheraldExitCode::ConfigError.into();
    }

    info!("Starting feedheraldd daemon");
    debug!("Configuration: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FeedheraldExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => FeedheraldExitCode::CleanShutdown,
            Err(e) => {
                let code = FeedheraldExitCode::for_error(&e);
                if code == FeedheraldExitCode::StorageUnavailable {
                    error!("History database unavailable, refusing to start: {:#}", e);
                } else {
                    error!("Daemon error: {:#}", e);
                }
                code
            }
        }
    });

    code.into()
}

/// Register every component this build was compiled with
fn build_registry() -> ComponentRegistry {
    let registry = ComponentRegistry::new();

    feedherald_source_http::register(&registry);

    #[cfg(feature = "mastodon")]
    feedherald_notifier_mastodon::register(&registry);

    #[cfg(feature = "gotify")]
    feedherald_notifier_gotify::register(&registry);

    debug!(
        "Registered sources: {:?}, notifiers: {:?}",
        registry.list_sources(),
        registry.list_notifiers()
    );
    registry
}

/// Run the daemon
async fn run_daemon(config: FeedheraldConfig) -> Result<()> {
    let registry = build_registry();

    let source = registry.create_source(&config.source)?;
    let notifier = registry.create_notifier(&config.notifier)?;
    let store = history::open(&config.history).await?;

    info!(
        "Watching feed via {} every {}s, announcing via {}",
        source.source_name(),
        config.poll.interval_secs,
        notifier.notifier_name()
    );

    let (engine, events) = FeedEngine::new(source, notifier, store, config)?;
    tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed, shutting down: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Drain engine events so the channel never fills
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::CycleCompleted { report } => debug!("Cycle report: {:?}", report),
            EngineEvent::FetchFailed { error } => warn!("Feed unavailable this cycle: {}", error),
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Wait for SIGTERM or SIGINT
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for SIGINT
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
