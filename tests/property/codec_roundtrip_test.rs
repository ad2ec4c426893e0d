// tests/property/codec_roundtrip_test.rs
//
// SPEC_FULL.md §8's "Round-trip & idempotence" property: decoding a framed
// packet always reproduces the packet that was framed, for every packet
// type and any payload within the declared size bound.

use bytes::{Bytes, BytesMut};
use cerver::core::protocol::codec::frame;
use cerver::core::protocol::{ErrorKind, ErrorPayload, Packet, PacketCodec};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

fn decode_one(bytes: Bytes) -> Packet {
    let mut codec = PacketCodec::default();
    let mut buf = BytesMut::from(&bytes[..]);
    codec
        .decode(&mut buf)
        .expect("a freshly framed packet must decode without error")
        .expect("a freshly framed packet must decode to completion in one call")
}

fn arb_payload_packet() -> impl Strategy<Value = Packet> {
    let payload = prop::collection::vec(any::<u8>(), 0..4096).prop_map(Bytes::from);
    (any::<u32>(), payload).prop_flat_map(|(request_type, payload)| {
        prop_oneof![
            Just(Packet::Cerver { request_type, payload: payload.clone() }),
            Just(Packet::Client { request_type, payload: payload.clone() }),
            Just(Packet::Auth { request_type, payload: payload.clone() }),
            Just(Packet::Request { request_type, payload: payload.clone() }),
            Just(Packet::Game { request_type, payload: payload.clone() }),
            Just(Packet::App { request_type, payload: payload.clone() }),
            Just(Packet::AppError { request_type, payload: payload.clone() }),
            Just(Packet::Custom { request_type, payload: payload.clone() }),
            Just(Packet::Test { request_type, payload }),
        ]
    })
}

fn arb_error_kind() -> impl Strategy<Value = ErrorKind> {
    prop_oneof![
        Just(ErrorKind::None),
        Just(ErrorKind::PacketError),
        Just(ErrorKind::FailedAuth),
        Just(ErrorKind::GetFile),
        Just(ErrorKind::SendFile),
        Just(ErrorKind::FileNotFound),
        Just(ErrorKind::CreateThread),
        Just(ErrorKind::Unknown),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// `parse(frame(p)) == p` for every non-`Error` packet type: these carry
    /// an opaque payload through untouched, so the round trip is exact.
    #[test]
    fn packet_survives_frame_then_decode(packet in arb_payload_packet()) {
        let framed = frame(packet.clone());
        let decoded = decode_one(framed);
        prop_assert_eq!(decoded, packet);
    }

    /// Feeding the decoder one byte at a time (worst-case fragmentation)
    /// produces the same packet as a single complete write, and the decoder
    /// never panics or yields early on a short buffer.
    #[test]
    fn packet_survives_fragmented_delivery(packet in arb_payload_packet()) {
        let framed = frame(packet.clone());
        let mut codec = PacketCodec::default();
        let mut buf = BytesMut::new();
        let mut decoded = None;
        for byte in framed.iter() {
            buf.extend_from_slice(std::slice::from_ref(byte));
            if let Some(p) = codec.decode(&mut buf).expect("decode must not error mid-fragment") {
                prop_assert!(decoded.is_none(), "decoder yielded more than one packet for one frame");
                decoded = Some(p);
            }
        }
        prop_assert_eq!(decoded, Some(packet));
    }

    /// `ErrorPayload::decode(payload.encode())` reproduces `error_type` and
    /// `timestamp` exactly, and `message` exactly whenever it already fits
    /// the fixed 31-byte slot and contains no embedded NUL (which would
    /// otherwise be read back as an early terminator).
    #[test]
    fn error_payload_survives_encode_then_decode(
        error_type in arb_error_kind(),
        timestamp in any::<i64>(),
        message in "[ -~]{0,31}",
    ) {
        let payload = ErrorPayload {
            error_type,
            timestamp,
            message: message.clone(),
        };
        let decoded = ErrorPayload::decode(&payload.encode()).expect("a freshly encoded payload always decodes");
        prop_assert_eq!(decoded.error_type, error_type);
        prop_assert_eq!(decoded.timestamp, timestamp);
        prop_assert_eq!(decoded.message, message);
    }
}
