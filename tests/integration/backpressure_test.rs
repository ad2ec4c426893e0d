// tests/integration/backpressure_test.rs
//
// SPEC_FULL.md §8 scenario 2 ("Backpressure"): a non-direct `APP` handler
// that sleeps 100ms per job. 50 requests on one connection must all come
// back, in order, within 6s, and the queue never holds more than the 50
// jobs that were ever pushed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use cerver::core::protocol::{Packet, PacketType};
use cerver::{CerverBuilder, Handler, HandlerContext, HandlerFn};
use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};

use super::test_helpers::{test_config, TestCerver};

const REQUEST_COUNT: u32 = 50;

fn boxed(f: impl Fn(HandlerContext, Packet) -> BoxFuture<'static, ()> + Send + Sync + 'static) -> HandlerFn {
    Arc::new(f)
}

#[tokio::test]
async fn backpressure_delivers_all_replies_in_order_without_dropping() {
    let config = test_config();
    let job_queue_capacity = config.job_queue_capacity;
    let builder = CerverBuilder::new(config).client_handler(
        PacketType::App,
        Handler::queued(
            boxed(|ctx, packet| {
                Box::pin(async move {
                    let Packet::App { request_type, .. } = packet else { return };
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    let reply = Packet::App {
                        request_type,
                        payload: Bytes::new(),
                    };
                    let _ = ctx.connection.socket.send(reply).await;
                })
            }),
            job_queue_capacity,
        )
        .0,
    );

    let server = TestCerver::start(builder).await;
    let mut client = server.connect().await;

    for seq in 0..REQUEST_COUNT {
        client
            .send(Packet::App {
                request_type: seq,
                payload: Bytes::new(),
            })
            .await
            .expect("send failed");
    }

    let max_queue_len = Arc::new(AtomicUsize::new(0));
    let max_queue_len_watcher = max_queue_len.clone();
    let cerver = server.cerver.clone();
    let watcher = tokio::spawn(async move {
        loop {
            let len = cerver
                .handlers
                .queues()
                .iter()
                .map(|q| q.len())
                .max()
                .unwrap_or(0);
            max_queue_len_watcher.fetch_max(len, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let replies = tokio::time::timeout(Duration::from_secs(6), async {
        let mut seen = Vec::with_capacity(REQUEST_COUNT as usize);
        for _ in 0..REQUEST_COUNT {
            let packet = client.next().await.expect("stream ended early").expect("decode error");
            let Packet::App { request_type, .. } = packet else {
                panic!("expected an App reply");
            };
            seen.push(request_type);
        }
        seen
    })
    .await
    .expect("did not receive all 50 replies within 6s");

    watcher.abort();

    let expected: Vec<u32> = (0..REQUEST_COUNT).collect();
    assert_eq!(replies, expected, "replies arrived out of order");
    assert!(
        max_queue_len.load(Ordering::SeqCst) <= REQUEST_COUNT as usize,
        "queue length exceeded the number of jobs ever pushed"
    );

    server.shutdown().await;
}
