// tests/integration/fd_reuse_test.rs
//
// SPEC_FULL.md §8 scenario 6 ("Fd reuse"): dropping a connection frees its
// readiness slot, and the next accepted connection can reuse that slot
// without picking up any packet meant for the connection that used to
// occupy it.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cerver::core::protocol::{Packet, PacketType};
use cerver::{CerverBuilder, Handler, HandlerContext, HandlerFn};
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};

use super::test_helpers::{test_config, TestCerver};

fn boxed(f: impl Fn(HandlerContext, Packet) -> BoxFuture<'static, ()> + Send + Sync + 'static) -> HandlerFn {
    Arc::new(f)
}

#[tokio::test]
async fn a_freed_slot_is_reused_without_leaking_stale_packets() {
    let builder = CerverBuilder::new(test_config()).client_handler(
        PacketType::App,
        Handler::direct(boxed(|ctx, packet| {
            Box::pin(async move {
                let Packet::App { request_type, payload } = packet else { return };
                let reply = Packet::App { request_type, payload };
                let _ = ctx.connection.socket.send(reply).await;
            })
        })),
    );

    let server = TestCerver::start(builder).await;
    assert_eq!(server.cerver.readiness.current_n_fds(), 0);

    let first = server.connect().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.cerver.readiness.current_n_fds(), 1);

    drop(first);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        server.cerver.readiness.current_n_fds(),
        0,
        "the first connection's slot was not freed after it dropped"
    );

    let mut second = server.connect().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        server.cerver.readiness.current_n_fds(),
        1,
        "the second connection did not reuse the freed slot"
    );

    second
        .send(Packet::App {
            request_type: 7,
            payload: Bytes::from_static(b"hello"),
        })
        .await
        .expect("send failed");

    let reply = tokio::time::timeout(Duration::from_secs(1), second.next())
        .await
        .expect("timed out waiting for reply")
        .expect("stream ended early")
        .expect("decode error");

    match reply {
        Packet::App { request_type, payload } => {
            assert_eq!(request_type, 7);
            assert_eq!(&payload[..], b"hello");
        }
        other => panic!("expected an App reply echoing the second connection's own packet, got {other:?}"),
    }

    server.shutdown().await;
}
