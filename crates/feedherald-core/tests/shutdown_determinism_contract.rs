//! Contract Test: Shutdown Determinism
//!
//! Constraints verified:
//! - Engine terminates on shutdown signal, even mid-sleep
//! - The history store is closed exactly once on exit
//! - A dropped shutdown sender also stops the engine
//! - Started and Stopped events bracket the run
//!
//! If this test fails, someone has added:
//! - Detached background tasks
//! - A sleep that ignores cancellation
//! - An exit path that leaks the store

mod common;

use common::*;
use feedherald_core::FeedEngine;
use feedherald_core::engine::EngineEvent;
use feedherald_core::traits::Item;
use tokio::time::Duration;

#[tokio::test]
async fn shutdown_interrupts_the_poll_sleep() {
    let store = FaultyHistoryStore::new();
    let source = ScriptedFeedSource::new(vec![Item::new("One", "https://blog/1", "a")]);

    // One hour between cycles; the test must not wait for it
    let (engine, _rx) = FeedEngine::new(
        Box::new(source.clone()),
        Box::new(CountingNotifier::new()),
        Box::new(store.clone()),
        fast_config(3600),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.fetch_count(), 1, "first cycle runs immediately");

    shutdown_tx.send(()).expect("shutdown signal send succeeds");

    let result = tokio::time::timeout(Duration::from_secs(5), engine_handle).await;
    assert!(result.is_ok(), "Engine should terminate within 5 seconds");
    assert!(result.unwrap().unwrap().is_ok());

    assert_eq!(store.close_count(), 1, "store closed exactly once");
    assert!(store.memory().is_closed());
}

#[tokio::test]
async fn dropped_sender_stops_the_engine() {
    let store = FaultyHistoryStore::new();
    let (engine, _rx) = FeedEngine::new(
        Box::new(ScriptedFeedSource::new(Vec::new())),
        Box::new(CountingNotifier::new()),
        Box::new(store.clone()),
        minimal_config(),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    drop(shutdown_tx);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        engine.run_with_shutdown(Some(shutdown_rx)),
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(store.close_count(), 1);
}

#[tokio::test]
async fn events_bracket_the_run() {
    let (engine, mut rx) = FeedEngine::new(
        Box::new(ScriptedFeedSource::new(Vec::new())),
        Box::new(CountingNotifier::new()),
        Box::new(FaultyHistoryStore::new()),
        minimal_config(),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        events.first(),
        Some(EngineEvent::Started { source, notifier, interval_secs: 3600 })
            if source == "scripted" && notifier == "counting"
    ));
    assert!(matches!(events.last(), Some(EngineEvent::Stopped { .. })));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, EngineEvent::CycleCompleted { .. }))
    );
}
