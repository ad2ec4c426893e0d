// src/core/protocol/header.rs

//! The fixed, host-native wire header every packet carries ahead of its payload.

use std::mem::size_of;

/// Protocol magic stamped into every header. Peers must run identical builds;
/// there is no byte-order negotiation.
pub const PROTOCOL_MAGIC: u32 = 0xCE_4E_52_21;

pub const PROTOCOL_VERSION_MAJOR: u16 = 1;
pub const PROTOCOL_VERSION_MINOR: u16 = 0;

/// Size of `Header` once packed on the wire: magic(4) + major(2) + minor(2) +
/// packet_type(4) + request_type(4) + packet_size(4) + sock_fd(4).
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 4 + 4 + 4 + 4;

/// Upper bound on a packet's declared total size. Guards against a malicious or
/// corrupt header causing an unbounded allocation.
pub const MAX_PACKET_SIZE: u32 = 16 * 1024 * 1024;

/// The packet-type tag carried in every header.
///
/// Modeled as a fixed-size-array index (see `PacketType::index`) rather than a
/// hashmap key, per the handlers-by-enum design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::FromRepr)]
#[repr(u32)]
pub enum PacketType {
    Cerver = 0,
    Client = 1,
    Error = 2,
    Auth = 3,
    Request = 4,
    Game = 5,
    App = 6,
    AppError = 7,
    Custom = 8,
    Test = 9,
}

impl PacketType {
    pub const COUNT: usize = 10;

    pub fn index(self) -> usize {
        self as u32 as usize
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::from_repr(value)
    }
}

/// A fixed header, present ahead of every packet's payload on the wire.
///
/// Byte order is host-native throughout: fields are read and written with
/// `bytes`' native-endian accessors, not `to_be`/`to_le`. This mirrors the
/// original C implementation, which never normalized byte order either;
/// portability between heterogeneous peers is not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version_major: u16,
    pub version_minor: u16,
    pub packet_type: u32,
    pub request_type: u32,
    /// Total packet size, inclusive of this header.
    pub packet_size: u32,
    /// Informational only: the sender's socket fd at framing time.
    pub sock_fd: i32,
}

impl Header {
    pub fn new(packet_type: PacketType, request_type: u32, payload_len: usize) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version_major: PROTOCOL_VERSION_MAJOR,
            version_minor: PROTOCOL_VERSION_MINOR,
            packet_type: packet_type.index() as u32,
            request_type,
            packet_size: (HEADER_SIZE + payload_len) as u32,
            sock_fd: -1,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.packet_size as usize - HEADER_SIZE
    }

    /// Verifies magic and version equality, per `codec.check(header)` in the spec.
    pub fn check(&self) -> bool {
        self.magic == PROTOCOL_MAGIC
            && self.version_major == PROTOCOL_VERSION_MAJOR
            && self.version_minor == PROTOCOL_VERSION_MINOR
    }
}

const _: () = assert!(HEADER_SIZE == size_of::<u32>() * 4 + size_of::<u16>() * 2 + size_of::<i32>());
