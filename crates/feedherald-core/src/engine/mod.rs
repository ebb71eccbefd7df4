//! Core feed engine
//!
//! The FeedEngine is responsible for:
//! - Fetching items via FeedSource
//! - Classifying each item against the HistoryStore
//! - Announcing new and updated items via Notifier
//! - Committing history only after a successful announcement
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ FeedSource  │─── Vec<Item> ───────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  FeedEngine  │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌──────────────┐          ┌──────────────┐           ┌─────────────┐
//! │ HistoryStore │          │   Notifier   │           │   Events    │
//! │ (lookup,     │          │  (announce)  │           │  (observe)  │
//! │  upsert)     │          └──────────────┘           └─────────────┘
//! └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch items
//! 2. Drop items rejected by the category filter
//! 3. Classify each item (NEW / UPDATED / UNCHANGED)
//! 4. Render and send the announcement for NEW and UPDATED
//! 5. On success, upsert the history record
//! 6. Sleep for the poll interval, or stop on shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::classifier::{Decision, classify};
use crate::config::FeedheraldConfig;
use crate::error::Result;
use crate::filter::CategoryFilter;
use crate::fingerprint::Fingerprint;
use crate::render::RenderPolicy;
use crate::traits::{FeedSource, HistoryStore, Item, Notifier};

/// Events emitted by the FeedEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        source: String,
        notifier: String,
        interval_secs: u64,
    },

    /// A poll cycle began
    CycleStarted { cycle: u64 },

    /// The feed could not be fetched; the cycle ends early
    FetchFailed { error: String },

    /// An item was classified
    ItemClassified { link: String, decision: Decision },

    /// An announcement went out
    NotifySucceeded { link: String, decision: Decision },

    /// An announcement failed; history was left untouched
    NotifyFailed { link: String, error: String },

    /// History now records this fingerprint for the link
    HistoryCommitted {
        link: String,
        fingerprint: Fingerprint,
    },

    /// A history read or write failed; the item was skipped
    StorageFailed { link: String, error: String },

    /// A poll cycle finished
    CycleCompleted { report: CycleReport },

    /// Engine stopped
    Stopped { reason: String },
}

/// Per-cycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Items returned by the source
    pub fetched: usize,
    /// Items rejected by the category filter
    pub filtered_out: usize,
    /// Items with an empty link
    pub skipped: usize,
    /// Items classified NEW
    pub new: usize,
    /// Items classified UPDATED
    pub updated: usize,
    /// Items classified UNCHANGED
    pub unchanged: usize,
    /// Announcements that went out
    pub notified: usize,
    /// Announcements that failed
    pub notify_failures: usize,
    /// History lookups or upserts that failed
    pub storage_errors: usize,
}

/// Core feed engine
///
/// The engine owns its source, notifier and history store and runs one
/// cycle at a time. Items within a cycle are handled sequentially, so the
/// classify → notify → upsert sequence for a link is never interleaved with
/// another.
///
/// ## Lifecycle
///
/// 1. Create with [`FeedEngine::new()`]
/// 2. Start with [`FeedEngine::run()`]
/// 3. Engine runs until a shutdown signal is received
/// 4. The history store is closed on every exit path
///
/// ## Delivery
///
/// History is written only after the notifier reports success. A failed
/// announcement leaves no trace and is retried on the next cycle, which
/// makes delivery at-least-once: if the upsert fails after a successful
/// announcement, the item is announced again next cycle.
pub struct FeedEngine {
    source: Box<dyn FeedSource>,
    notifier: Box<dyn Notifier>,
    store: Box<dyn HistoryStore>,
    filter: CategoryFilter,
    render: RenderPolicy,
    interval: Duration,
    cycles: AtomicU64,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl FeedEngine {
    /// Create a new feed engine
    ///
    /// # Parameters
    ///
    /// - `source`: Feed source implementation
    /// - `notifier`: Notifier implementation
    /// - `store`: History store, already opened
    /// - `config`: feedherald configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn FeedSource>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn HistoryStore>,
        config: FeedheraldConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let poll = config.poll;
        let (tx, rx) = mpsc::channel(poll.event_channel_capacity);

        let engine = Self {
            source,
            notifier,
            store,
            filter: CategoryFilter::new(poll.category),
            render: RenderPolicy::new(poll.inline_title_prefix),
            interval: Duration::from_secs(poll.interval_secs),
            cycles: AtomicU64::new(0),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Delay between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the engine until SIGINT (Ctrl-C)
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until the given oneshot fires (or its sender is dropped)
    ///
    /// The daemon wires its SIGTERM/SIGINT handler to this; tests use it to
    /// stop the loop deterministically. `None` falls back to Ctrl-C.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, mut shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            source: self.source.source_name().to_string(),
            notifier: self.notifier.notifier_name().to_string(),
            interval_secs: self.interval.as_secs(),
        });

        match self.store.list_links().await {
            Ok(links) => info!("History holds {} links", links.len()),
            Err(e) => warn!("Could not list history: {}", e),
        }

        let outcome = self.poll_loop(&mut shutdown_rx).await;

        let reason = match &outcome {
            Ok(()) => "Shutdown signal".to_string(),
            Err(e) => e.to_string(),
        };
        self.emit_event(EngineEvent::Stopped { reason });

        // Close on every exit path, but report the loop's error first
        let closed = self.store.close().await;
        match (outcome, closed) {
            (Err(e), _) => Err(e),
            (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => {
                info!("History closed, engine stopped");
                Ok(())
            }
        }
    }

    async fn poll_loop(&self, shutdown_rx: &mut Option<oneshot::Receiver<()>>) -> Result<()> {
        loop {
            match self.poll_once().await {
                Ok(report) => debug!("Cycle finished: {:?}", report),
                Err(e) if e.is_fatal() => {
                    error!("Fatal error, stopping: {}", e);
                    return Err(e);
                }
                Err(e) => warn!("Cycle aborted: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = wait_for_shutdown(shutdown_rx) => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    /// Run a single cycle: fetch, filter, then classify, notify and commit
    /// each item in feed order
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: The cycle ran; per-item failures are counted in
    ///   the report, not returned
    /// - `Err(Error)`: The feed could not be fetched
    pub async fn poll_once(&self) -> Result<CycleReport> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit_event(EngineEvent::CycleStarted { cycle });

        let items = match self.source.fetch().await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to fetch feed from {}: {}", self.source.source_name(), e);
                self.emit_event(EngineEvent::FetchFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut report = CycleReport {
            fetched: items.len(),
            ..CycleReport::default()
        };
        debug!("Fetched {} items", items.len());

        for item in &items {
            if !self.filter.accepts(item) {
                report.filtered_out += 1;
                continue;
            }
            self.handle_item(item, &mut report).await;
        }

        info!(
            "Cycle {}: {} new, {} updated, {} unchanged, {} notify failures, {} storage errors",
            cycle,
            report.new,
            report.updated,
            report.unchanged,
            report.notify_failures,
            report.storage_errors
        );
        self.emit_event(EngineEvent::CycleCompleted {
            report: report.clone(),
        });

        Ok(report)
    }

    /// Handle one item end to end
    ///
    /// Failures are logged and counted; none of them stop the cycle.
    async fn handle_item(&self, item: &Item, report: &mut CycleReport) {
        if item.link.is_empty() {
            warn!("Skipping item without a link (title: {:?})", item.title);
            report.skipped += 1;
            return;
        }

        let classification = match classify(item, self.store.as_ref()).await {
            Ok(c) => c,
            Err(e) => {
                error!("History lookup failed for {}: {}", item.link, e);
                report.storage_errors += 1;
                self.emit_event(EngineEvent::StorageFailed {
                    link: item.link.clone(),
                    error: e.to_string(),
                });
                return;
            }
        };

        let decision = classification.decision;
        self.emit_event(EngineEvent::ItemClassified {
            link: item.link.clone(),
            decision,
        });

        match decision {
            Decision::New => report.new += 1,
            Decision::Updated => report.updated += 1,
            Decision::Unchanged => report.unchanged += 1,
        }

        let Some(text) = self.render.render(decision, item) else {
            debug!("{} unchanged, nothing to announce", item.link);
            return;
        };

        if let Err(e) = self.notifier.notify(&text).await {
            warn!(
                "Failed to announce {} item {} via {}: {}",
                decision,
                item.link,
                self.notifier.notifier_name(),
                e
            );
            report.notify_failures += 1;
            self.emit_event(EngineEvent::NotifyFailed {
                link: item.link.clone(),
                error: e.to_string(),
            });
            return;
        }

        report.notified += 1;
        info!("Announced {} item {}", decision, item.link);
        self.emit_event(EngineEvent::NotifySucceeded {
            link: item.link.clone(),
            decision,
        });

        match self
            .store
            .upsert(&item.link, &classification.fingerprint, Utc::now())
            .await
        {
            Ok(()) => self.emit_event(EngineEvent::HistoryCommitted {
                link: item.link.clone(),
                fingerprint: classification.fingerprint,
            }),
            Err(e) => {
                error!(
                    "Announced {} but failed to record it, it will be announced again: {}",
                    item.link, e
                );
                report.storage_errors += 1;
                self.emit_event(EngineEvent::StorageFailed {
                    link: item.link.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Emit an engine event
    ///
    /// The channel is bounded; when it is full the event is dropped.
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Resolve when the caller asks the loop to stop
///
/// A dropped sender counts as a shutdown request.
async fn wait_for_shutdown(shutdown_rx: &mut Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

impl std::fmt::Debug for FeedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("source", &self.source.source_name())
            .field("notifier", &self.notifier.notifier_name())
            .field("filter", &self.filter)
            .field("interval", &self.interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedSourceConfig, HistoryStoreConfig, NotifierConfig};
    use crate::Error;
    use crate::history::MemoryHistoryStore;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FixedSource(Vec<Item>);

    #[async_trait]
    impl FeedSource for FixedSource {
        async fn fetch(&self) -> Result<Vec<Item>> {
            Ok(self.0.clone())
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) -> Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn notifier_name(&self) -> &'static str {
            "recording"
        }
    }

    fn config() -> FeedheraldConfig {
        let mut config = FeedheraldConfig::new(
            FeedSourceConfig::Custom {
                factory: "fixed".to_string(),
                config: serde_json::json!({}),
            },
            NotifierConfig::Custom {
                factory: "recording".to_string(),
                config: serde_json::json!({}),
            },
        );
        config.history = HistoryStoreConfig::Memory;
        config
    }

    #[tokio::test]
    async fn filter_and_empty_links_are_counted() {
        let items = vec![
            Item::new("Rust", "https://blog/posts/rust-intro", "a"),
            Item::new("Go", "https://blog/posts/go-intro", "b"),
            Item::new("Nameless", "", "c"),
        ];
        let notifier = RecordingNotifier::default();
        let mut config = config();
        config.poll.category = Some("rust".to_string());

        let (engine, _rx) = FeedEngine::new(
            Box::new(FixedSource(items)),
            Box::new(notifier.clone()),
            Box::new(MemoryHistoryStore::new()),
            config,
        )
        .unwrap();

        let report = engine.poll_once().await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.filtered_out, 2);
        assert_eq!(report.new, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            notifier.0.lock().unwrap().as_slice(),
            ["New blog post: https://blog/posts/rust-intro"]
        );
    }

    #[tokio::test]
    async fn empty_link_is_skipped_without_notify() {
        let notifier = RecordingNotifier::default();
        let store = MemoryHistoryStore::new();
        let (engine, _rx) = FeedEngine::new(
            Box::new(FixedSource(vec![Item::new("t", "", "b")])),
            Box::new(notifier.clone()),
            Box::new(store.clone()),
            config(),
        )
        .unwrap();

        let report = engine.poll_once().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(notifier.0.lock().unwrap().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn events_follow_cycle_order() {
        let (engine, mut rx) = FeedEngine::new(
            Box::new(FixedSource(vec![Item::new("t", "https://x/1", "hello")])),
            Box::new(RecordingNotifier::default()),
            Box::new(MemoryHistoryStore::new()),
            config(),
        )
        .unwrap();

        engine.poll_once().await.unwrap();

        assert_eq!(rx.recv().await, Some(EngineEvent::CycleStarted { cycle: 1 }));
        assert!(matches!(
            rx.recv().await,
            Some(EngineEvent::ItemClassified { decision: Decision::New, .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(EngineEvent::NotifySucceeded { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(EngineEvent::HistoryCommitted { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(EngineEvent::CycleCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn full_event_channel_does_not_block() {
        let mut config = config();
        config.poll.event_channel_capacity = 1;
        let items = (0..10)
            .map(|i| Item::new("t", format!("https://x/{}", i), "b"))
            .collect();

        let (engine, _rx) = FeedEngine::new(
            Box::new(FixedSource(items)),
            Box::new(RecordingNotifier::default()),
            Box::new(MemoryHistoryStore::new()),
            config,
        )
        .unwrap();

        let report = engine.poll_once().await.unwrap();
        assert_eq!(report.notified, 10);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.poll.interval_secs = 0;

        let result = FeedEngine::new(
            Box::new(FixedSource(Vec::new())),
            Box::new(RecordingNotifier::default()),
            Box::new(MemoryHistoryStore::new()),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
