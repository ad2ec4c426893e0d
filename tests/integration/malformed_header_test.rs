// tests/integration/malformed_header_test.rs
//
// SPEC_FULL.md §8 scenario 3 ("Malformed header"): a wrong-magic header with
// an otherwise valid declared size is a recoverable `PacketError` — the
// codec still advances past it and the server replies with an error packet
// — but `n_bad_packets_limit` of them in a row closes the connection.

use std::time::Duration;

use cerver::core::protocol::{ErrorKind, Packet, HEADER_SIZE};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::test_helpers::{test_config, TestCerver};

/// Hand-assembles a header with the wrong magic but an otherwise valid
/// declared size, bypassing `PacketCodec::encode` (which always stamps the
/// correct magic) so the bytes actually exercise the codec's mismatch path.
fn bad_magic_header() -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(&0xDEAD_BEEFu32.to_ne_bytes()); // wrong magic
    buf.extend_from_slice(&1u16.to_ne_bytes()); // version major
    buf.extend_from_slice(&0u16.to_ne_bytes()); // version minor
    buf.extend_from_slice(&0u32.to_ne_bytes()); // packet_type (Cerver)
    buf.extend_from_slice(&0u32.to_ne_bytes()); // request_type
    buf.extend_from_slice(&(HEADER_SIZE as u32).to_ne_bytes()); // packet_size: header only
    buf.extend_from_slice(&(-1i32).to_ne_bytes()); // sock_fd
    buf
}

#[tokio::test]
async fn malformed_header_closes_connection_after_bad_packet_limit() {
    let mut config = test_config();
    config.n_bad_packets_limit = 3;
    let server = TestCerver::start(cerver::CerverBuilder::new(config)).await;

    let mut framed = server.connect().await;

    for _ in 0..3 {
        framed
            .get_mut()
            .write_all(&bad_magic_header())
            .await
            .expect("write failed");

        let reply = tokio::time::timeout(Duration::from_secs(1), framed.next())
            .await
            .expect("timed out waiting for error packet")
            .expect("stream ended early")
            .expect("decode error");

        match reply {
            Packet::Error(payload) => assert_eq!(payload.error_type, ErrorKind::PacketError),
            other => panic!("expected an Error/PacketError reply, got {other:?}"),
        }
    }

    // The limit was just reached (>= per the spec's uniform resolution of
    // the open question): the connection should now be closed, so either
    // the next read returns EOF/an error, or the decoder observes a closed
    // stream promptly.
    let closed = tokio::time::timeout(Duration::from_secs(1), framed.next()).await;
    match closed {
        Ok(None) => {}
        Ok(Some(Err(_))) => {}
        Ok(Some(Ok(packet))) => panic!("expected the connection to be closed, got {packet:?}"),
        Err(_) => panic!("connection was not closed after reaching the bad packet limit"),
    }

    server.shutdown().await;
}
