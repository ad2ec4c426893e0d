// src/core/protocol/mod.rs

pub mod codec;
pub mod header;
pub mod packet;

pub use codec::PacketCodec;
pub use header::{Header, PacketType, HEADER_SIZE, MAX_PACKET_SIZE};
pub use packet::{AuthRequestType, CerverRequestType, ErrorKind, ErrorPayload, Packet};
