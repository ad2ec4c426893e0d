// tests/integration/echo_test.rs
//
// SPEC_FULL.md §8 scenario 1 ("Echo"): a single direct `APP` handler replies
// to a `TEST_MSG` request with an empty-payload `TEST_MSG` reply; closing
// the connection fires `CLIENT_CLOSE_CONNECTION` exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use cerver::core::events::{Event, EventData};
use cerver::core::protocol::{Packet, PacketType};
use cerver::{CerverBuilder, Handler, HandlerContext, HandlerFn};
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};

use super::test_helpers::{test_config, TestCerver};

const TEST_MSG: u32 = 42;

fn boxed(f: impl Fn(HandlerContext, Packet) -> BoxFuture<'static, ()> + Send + Sync + 'static) -> HandlerFn {
    Arc::new(f)
}

#[tokio::test]
async fn echo_replies_once_and_fires_close_event() {
    let close_events = Arc::new(AtomicUsize::new(0));
    let close_events_for_action = close_events.clone();

    let builder = CerverBuilder::new(test_config())
        .client_handler(
            PacketType::App,
            Handler::direct(boxed(|ctx, packet| {
                Box::pin(async move {
                    let Packet::App { request_type, .. } = packet else { return };
                    if request_type == TEST_MSG {
                        let reply = Packet::App {
                            request_type: TEST_MSG,
                            payload: Bytes::new(),
                        };
                        let _ = ctx.connection.socket.send(reply).await;
                    }
                })
            })),
        )
        .on_event(
            Event::ClientCloseConnection,
            Arc::new(move |_data: EventData| {
                close_events_for_action.fetch_add(1, Ordering::SeqCst);
            }),
            false,
            false,
        );

    let server = TestCerver::start(builder).await;

    let mut client = server.connect().await;
    client
        .send(Packet::App {
            request_type: TEST_MSG,
            payload: Bytes::new(),
        })
        .await
        .expect("send failed");

    let reply = tokio::time::timeout(Duration::from_secs(1), client.next())
        .await
        .expect("timed out waiting for echo reply")
        .expect("stream ended before a reply arrived")
        .expect("decode error");

    match reply {
        Packet::App { request_type, payload } => {
            assert_eq!(request_type, TEST_MSG);
            assert!(payload.is_empty());
        }
        other => panic!("expected an App/TEST_MSG reply, got {other:?}"),
    }

    // No second reply shows up unsolicited.
    let second = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(second.is_err(), "received an unexpected second reply");

    drop(client);
    // Give the server's reader task a moment to notice the peer hung up and
    // run the drop path before asserting on the close event.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(close_events.load(Ordering::SeqCst), 1);

    server.shutdown().await;
}
