// src/core/protocol/codec.rs

//! The stream reassembler: a pull parser over a per-connection buffer, driven
//! by `tokio_util::codec::Framed`. Mirrors the teacher's `RespFrameCodec`:
//! `decode` returns `Ok(None)` on a short buffer and only advances the buffer
//! once a complete frame is available.
//!
//! §4.1/§4.4 draw a line this codec honors precisely: a declared size outside
//! `[HEADER_SIZE, MAX_PACKET_SIZE]` means the framing itself can't be
//! trusted — there is no safe number of bytes to skip to resynchronize — so
//! that case is `FramingFatal` and the buffer is left untouched; the caller
//! has no option but to drop the connection. Once a size-valid frame is
//! sliced off, any remaining problem (magic/version mismatch when
//! `check_packets` is on, an unknown packet type, a malformed payload) is a
//! `PacketError` raised *after* the buffer has already advanced past the
//! bad frame — recoverable, per §7: bump the bad-packet counter and keep
//! reading.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::header::{HEADER_SIZE, Header, MAX_PACKET_SIZE, PacketType};
use super::packet::Packet;
use crate::core::errors::CerverError;

#[derive(Debug)]
pub struct PacketCodec {
    /// Receive buffer size hint (spec §6 "receive buffer size"); used only to
    /// pre-reserve capacity, not to cap reads.
    pub receive_buffer_size: usize,
    /// §4.4 step 1: when `false`, a header's magic/version mismatch is
    /// tolerated rather than raised as a `PacketError`.
    pub check_packets: bool,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self {
            receive_buffer_size: HEADER_SIZE,
            check_packets: true,
        }
    }
}

impl PacketCodec {
    pub fn new(receive_buffer_size: usize, check_packets: bool) -> Self {
        Self {
            receive_buffer_size,
            check_packets,
        }
    }

    /// Reads every header field without validating them; callers decide
    /// which mismatches are fatal and which are merely recoverable.
    fn read_header(src: &[u8]) -> Header {
        debug_assert!(src.len() >= HEADER_SIZE);
        let mut cur = src;
        Header {
            magic: cur.get_u32_ne(),
            version_major: cur.get_u16_ne(),
            version_minor: cur.get_u16_ne(),
            packet_type: cur.get_u32_ne(),
            request_type: cur.get_u32_ne(),
            packet_size: cur.get_u32_ne(),
            sock_fd: cur.get_i32_ne(),
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = CerverError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_SIZE {
            src.reserve(self.receive_buffer_size.max(HEADER_SIZE));
            return Ok(None);
        }

        let header = Self::read_header(&src[..HEADER_SIZE]);
        let total_len = header.packet_size as usize;

        if total_len < HEADER_SIZE || header.packet_size > MAX_PACKET_SIZE {
            return Err(CerverError::FramingFatal(format!(
                "declared packet size {total_len} out of bounds"
            )));
        }

        if src.len() < total_len {
            src.reserve(total_len - src.len());
            return Ok(None);
        }

        // The frame's boundary is now trustworthy: slice it off and advance
        // the buffer before checking anything else, so every failure past
        // this point is recoverable rather than framing-fatal.
        let mut frame = src.split_to(total_len);
        frame.advance(HEADER_SIZE);
        let payload: Bytes = frame.freeze();

        if self.check_packets && !header.check() {
            return Err(CerverError::PacketError(format!(
                "header check failed: magic={:#x} version={}.{}",
                header.magic, header.version_major, header.version_minor
            )));
        }

        Packet::from_parts(&header, payload)
            .ok_or_else(|| CerverError::PacketError("malformed payload for packet type".into()))
            .map(Some)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = CerverError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = item.payload();
        let header = Header::new(item.packet_type(), item.request_type(), payload.len());

        dst.reserve(HEADER_SIZE + payload.len());
        dst.put_u32_ne(header.magic);
        dst.put_u16_ne(header.version_major);
        dst.put_u16_ne(header.version_minor);
        dst.put_u32_ne(header.packet_type);
        dst.put_u32_ne(header.request_type);
        dst.put_u32_ne(header.packet_size);
        dst.put_i32_ne(header.sock_fd);
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    Short,
    Magic,
    Version,
}

/// Standalone header parser (spec §4.1's `parse_header`), used outside the
/// `Decoder` impl — by tests exercising the wire format directly and by
/// anything that wants a header check without going through `Framed`.
pub fn parse_header(bytes: &[u8]) -> Result<Header, HeaderError> {
    if bytes.len() < HEADER_SIZE {
        return Err(HeaderError::Short);
    }
    let header = PacketCodec::read_header(bytes);
    if header.magic != super::header::PROTOCOL_MAGIC {
        return Err(HeaderError::Magic);
    }
    if header.version_major != super::header::PROTOCOL_VERSION_MAJOR
        || header.version_minor != super::header::PROTOCOL_VERSION_MINOR
    {
        return Err(HeaderError::Version);
    }
    Ok(header)
}

/// Frames a packet into wire bytes, per spec §4.1's `frame`.
pub fn frame(packet: Packet) -> Bytes {
    let mut dst = BytesMut::new();
    let mut codec = PacketCodec::default();
    codec.encode(packet, &mut dst).expect("encoding never fails");
    dst.freeze()
}
