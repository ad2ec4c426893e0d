// tests/integration/admin_auth_test.rs
//
// SPEC_FULL.md §8 scenario 4 ("Admin auth"): a single rejected credential on
// the admin plane fires `CLIENT_AUTH_FAIL`, closes the connection
// unconditionally (independent of the bad-packet limit), and leaves the
// admin count at zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use cerver::core::events::{Event, EventData};
use cerver::core::protocol::{AuthRequestType, ErrorKind, Packet};
use cerver::CerverBuilder;
use futures::{SinkExt, StreamExt};

use super::test_helpers::{test_config, TestCerver};

#[tokio::test]
async fn rejected_admin_credential_closes_connection_and_fires_auth_fail() {
    let mut config = test_config();
    config.admin.enabled = true;
    config.admin.port = 0;
    config.admin.host = "127.0.0.1".to_string();
    // Left at the default (> 1) on purpose: a rejected credential must close
    // on the first attempt, not after the bad-packet limit is reached.

    let auth_fail_count = Arc::new(AtomicUsize::new(0));
    let auth_fail_count_for_action = auth_fail_count.clone();

    let builder = CerverBuilder::new(config)
        .admin_authenticate(Arc::new(|_credential: &Bytes| false))
        .on_event(
            Event::ClientAuthFail,
            Arc::new(move |_data: EventData| {
                auth_fail_count_for_action.fetch_add(1, Ordering::SeqCst);
            }),
            false,
            false,
        );

    let server = TestCerver::start(builder).await;
    assert_eq!(server.cerver.admin().unwrap().registry.len(), 0);

    let mut admin_conn = server.connect_admin().await;
    admin_conn
        .send(Packet::Auth {
            request_type: AuthRequestType::Response as u32,
            payload: Bytes::from_static(b"wrong-credential"),
        })
        .await
        .expect("send failed");

    let reply = tokio::time::timeout(Duration::from_secs(1), admin_conn.next())
        .await
        .expect("timed out waiting for the auth failure reply")
        .expect("stream ended early")
        .expect("decode error");
    match reply {
        Packet::Error(payload) => assert_eq!(payload.error_type, ErrorKind::FailedAuth),
        other => panic!("expected an Error/FailedAuth reply, got {other:?}"),
    }

    let closed = tokio::time::timeout(Duration::from_secs(1), admin_conn.next()).await;
    match closed {
        Ok(None) | Ok(Some(Err(_))) => {}
        Ok(Some(Ok(packet))) => panic!("expected the admin connection to be closed, got {packet:?}"),
        Err(_) => panic!("admin connection was not closed after a rejected credential"),
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(auth_fail_count.load(Ordering::SeqCst), 1);
    assert_eq!(server.cerver.admin().unwrap().registry.len(), 0);

    server.shutdown().await;
}
