// tests/integration/teardown_test.rs
//
// SPEC_FULL.md §8 scenario 5 ("Teardown"): tearing down a cerver with
// several live connections closes every socket, fires `CERVER_TEARDOWN`
// exactly once, and returns promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cerver::core::events::{Event, EventData};
use cerver::CerverBuilder;
use futures::StreamExt;

use super::test_helpers::{test_config, TestCerver};

#[tokio::test]
async fn teardown_closes_all_connections_and_fires_once() {
    let teardown_count = Arc::new(AtomicUsize::new(0));
    let teardown_count_for_action = teardown_count.clone();

    let builder = CerverBuilder::new(test_config()).on_event(
        Event::CerverTeardown,
        Arc::new(move |_data: EventData| {
            teardown_count_for_action.fetch_add(1, Ordering::SeqCst);
        }),
        false,
        false,
    );

    let server = TestCerver::start(builder).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(server.connect().await);
    }
    assert_eq!(server.cerver.clients.len(), 3);

    let started = tokio::time::Instant::now();
    server.shutdown().await;
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_secs(7),
        "teardown took too long: {elapsed:?}"
    );

    for mut client in clients {
        let closed = tokio::time::timeout(Duration::from_secs(1), client.next()).await;
        match closed {
            Ok(None) | Ok(Some(Err(_))) => {}
            Ok(Some(Ok(packet))) => panic!("expected connection to be closed, got {packet:?}"),
            Err(_) => panic!("connection was not closed by teardown"),
        }
    }

    assert_eq!(teardown_count.load(Ordering::SeqCst), 1);
}
