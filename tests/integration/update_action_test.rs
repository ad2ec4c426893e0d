// tests/integration/update_action_test.rs
//
// SPEC_FULL.md §4.8: periodic update/interval threads pass a shared
// `CerverUpdate{cerver, args}` to an embedder-registered callable. Exercises
// `CerverBuilder::update_action`/`interval_action` end to end instead of the
// hardcoded no-op heartbeat `spawner::spawn_all` falls back to when neither
// is registered.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cerver::config::{Config, IntervalConfig, UpdateConfig};

use super::test_helpers::{test_config, TestCerver};

#[tokio::test]
async fn registered_update_action_fires_on_the_configured_cadence() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticks_for_action = ticks.clone();

    let mut config = test_config();
    config.update = Some(UpdateConfig { ticks_per_second: 20 });

    let builder = cerver::CerverBuilder::new(config).update_action(Arc::new(move |_update| {
        ticks_for_action.fetch_add(1, Ordering::SeqCst);
    }));

    let server = TestCerver::start(builder).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    server.shutdown().await;

    assert!(
        ticks.load(Ordering::SeqCst) >= 2,
        "expected the registered update action to have fired at least twice, got {}",
        ticks.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn registered_interval_action_fires_once_per_interval() {
    let fires = Arc::new(AtomicUsize::new(0));
    let fires_for_action = fires.clone();

    let mut config: Config = test_config();
    config.interval = Some(IntervalConfig { seconds: 1 });

    let builder = cerver::CerverBuilder::new(config).interval_action(Arc::new(move |_update| {
        fires_for_action.fetch_add(1, Ordering::SeqCst);
    }));

    let server = TestCerver::start(builder).await;
    tokio::time::sleep(Duration::from_millis(1200)).await;
    server.shutdown().await;

    assert_eq!(fires.load(Ordering::SeqCst), 1);
}
