// tests/integration/request_game_test.rs
//
// SPEC_FULL.md §4.4 (unchanged from spec.md): "`ERROR`, `AUTH`, `REQUEST`,
// `GAME` have built-in handlers" on both planes. These are exercised only
// at the wire-codec level elsewhere (tests/property/codec_roundtrip_test.rs);
// this covers actual dispatch through the built-in handler table with no
// embedder handler registered for either type.

use std::time::Duration;

use bytes::Bytes;
use cerver::core::protocol::Packet;
use futures::{SinkExt, StreamExt};

use super::test_helpers::{test_config, TestCerver};

const SOME_REQUEST_TYPE: u32 = 7;
const SOME_GAME_TYPE: u32 = 3;

#[tokio::test]
async fn request_packet_is_acknowledged_without_an_embedder_handler() {
    let server = TestCerver::start(cerver::CerverBuilder::new(test_config())).await;
    let mut client = server.connect().await;

    client
        .send(Packet::Request {
            request_type: SOME_REQUEST_TYPE,
            payload: Bytes::from_static(b"hello"),
        })
        .await
        .expect("send failed");

    let reply = tokio::time::timeout(Duration::from_secs(1), client.next())
        .await
        .expect("timed out waiting for a REQUEST ack")
        .expect("stream ended before a reply arrived")
        .expect("decode error");

    match reply {
        Packet::Request { request_type, payload } => {
            assert_eq!(request_type, SOME_REQUEST_TYPE);
            assert_eq!(payload, Bytes::from_static(b"hello"));
        }
        other => panic!("expected a Request ack, got {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn game_packet_is_acknowledged_without_an_embedder_handler() {
    let server = TestCerver::start(cerver::CerverBuilder::new(test_config())).await;
    let mut client = server.connect().await;

    client
        .send(Packet::Game {
            request_type: SOME_GAME_TYPE,
            payload: Bytes::from_static(b"move"),
        })
        .await
        .expect("send failed");

    let reply = tokio::time::timeout(Duration::from_secs(1), client.next())
        .await
        .expect("timed out waiting for a GAME ack")
        .expect("stream ended before a reply arrived")
        .expect("decode error");

    match reply {
        Packet::Game { request_type, payload } => {
            assert_eq!(request_type, SOME_GAME_TYPE);
            assert_eq!(payload, Bytes::from_static(b"move"));
        }
        other => panic!("expected a Game ack, got {other:?}"),
    }

    server.shutdown().await;
}
