// src/core/protocol/packet.rs

//! The sum type over known packet kinds, replacing the original type-tag +
//! payload-cast pattern (design note "tagged packet variants").

use bytes::Bytes;

use super::header::{Header, PacketType};

/// Length of the fixed message buffer inside an error payload, null-padded.
pub const ERROR_MESSAGE_LENGTH: usize = 32;

/// The flat error taxonomy from the error-handling design (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr)]
#[repr(u32)]
pub enum ErrorKind {
    None = 0,
    PacketError = 1,
    FailedAuth = 2,
    GetFile = 3,
    SendFile = 4,
    FileNotFound = 5,
    CreateThread = 6,
    Unknown = 7,
}

impl ErrorKind {
    pub fn from_u32(value: u32) -> Self {
        Self::from_repr(value).unwrap_or(ErrorKind::Unknown)
    }
}

/// `error_type:u32 timestamp:i64 msg:char[32]` (null-padded), as carried by an
/// `ERROR`-type packet's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error_type: ErrorKind,
    pub timestamp: i64,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(error_type: ErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        message.truncate(ERROR_MESSAGE_LENGTH - 1);
        Self {
            error_type,
            timestamp: chrono::Utc::now().timestamp(),
            message,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = Vec::with_capacity(4 + 8 + ERROR_MESSAGE_LENGTH);
        buf.extend_from_slice(&(self.error_type as u32).to_ne_bytes());
        buf.extend_from_slice(&self.timestamp.to_ne_bytes());
        let mut msg_bytes = [0u8; ERROR_MESSAGE_LENGTH];
        let src = self.message.as_bytes();
        let n = src.len().min(ERROR_MESSAGE_LENGTH - 1);
        msg_bytes[..n].copy_from_slice(&src[..n]);
        buf.extend_from_slice(&msg_bytes);
        Bytes::from(buf)
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 + 8 + ERROR_MESSAGE_LENGTH {
            return None;
        }
        let error_type = ErrorKind::from_u32(u32::from_ne_bytes(bytes[0..4].try_into().ok()?));
        let timestamp = i64::from_ne_bytes(bytes[4..12].try_into().ok()?);
        let msg_bytes = &bytes[12..12 + ERROR_MESSAGE_LENGTH];
        let nul = msg_bytes.iter().position(|&b| b == 0).unwrap_or(msg_bytes.len());
        let message = String::from_utf8_lossy(&msg_bytes[..nul]).into_owned();
        Some(Self {
            error_type,
            timestamp,
            message,
        })
    }
}

/// A decoded wire packet: header plus typed payload.
///
/// Unknown packet-type tags never occur post-decode (`PacketCodec` rejects
/// them at the header-check stage); within the known set, `Custom` is the
/// catch-all arm that carries an opaque payload routed to user `CUSTOM`
/// handlers, per the design note on tagged packet variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Cerver { request_type: u32, payload: Bytes },
    Client { request_type: u32, payload: Bytes },
    Error(ErrorPayload),
    Auth { request_type: u32, payload: Bytes },
    Request { request_type: u32, payload: Bytes },
    Game { request_type: u32, payload: Bytes },
    App { request_type: u32, payload: Bytes },
    AppError { request_type: u32, payload: Bytes },
    Custom { request_type: u32, payload: Bytes },
    Test { request_type: u32, payload: Bytes },
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Cerver { .. } => PacketType::Cerver,
            Packet::Client { .. } => PacketType::Client,
            Packet::Error(_) => PacketType::Error,
            Packet::Auth { .. } => PacketType::Auth,
            Packet::Request { .. } => PacketType::Request,
            Packet::Game { .. } => PacketType::Game,
            Packet::App { .. } => PacketType::App,
            Packet::AppError { .. } => PacketType::AppError,
            Packet::Custom { .. } => PacketType::Custom,
            Packet::Test { .. } => PacketType::Test,
        }
    }

    pub fn request_type(&self) -> u32 {
        match self {
            Packet::Error(payload) => payload.error_type as u32,
            Packet::Cerver { request_type, .. }
            | Packet::Client { request_type, .. }
            | Packet::Auth { request_type, .. }
            | Packet::Request { request_type, .. }
            | Packet::Game { request_type, .. }
            | Packet::App { request_type, .. }
            | Packet::AppError { request_type, .. }
            | Packet::Custom { request_type, .. }
            | Packet::Test { request_type, .. } => *request_type,
        }
    }

    pub fn payload(&self) -> Bytes {
        match self {
            Packet::Error(payload) => payload.encode(),
            Packet::Cerver { payload, .. }
            | Packet::Client { payload, .. }
            | Packet::Auth { payload, .. }
            | Packet::Request { payload, .. }
            | Packet::Game { payload, .. }
            | Packet::App { payload, .. }
            | Packet::AppError { payload, .. }
            | Packet::Custom { payload, .. }
            | Packet::Test { payload, .. } => payload.clone(),
        }
    }

    pub fn from_parts(header: &Header, payload: Bytes) -> Option<Self> {
        let request_type = header.request_type;
        let packet_type = PacketType::from_u32(header.packet_type)?;
        Some(match packet_type {
            PacketType::Cerver => Packet::Cerver { request_type, payload },
            PacketType::Client => Packet::Client { request_type, payload },
            PacketType::Error => Packet::Error(ErrorPayload::decode(&payload)?),
            PacketType::Auth => Packet::Auth { request_type, payload },
            PacketType::Request => Packet::Request { request_type, payload },
            PacketType::Game => Packet::Game { request_type, payload },
            PacketType::App => Packet::App { request_type, payload },
            PacketType::AppError => Packet::AppError { request_type, payload },
            PacketType::Custom => Packet::Custom { request_type, payload },
            PacketType::Test => Packet::Test { request_type, payload },
        })
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Packet::Error(ErrorPayload::new(kind, message))
    }
}

/// Known request subtypes for `CERVER`-typed packets, per §4.4's built-in list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr)]
#[repr(u32)]
pub enum CerverRequestType {
    Ping = 0,
    TeardownNotify = 1,
    Report = 2,
}

/// Known request subtypes for `AUTH`-typed packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr)]
#[repr(u32)]
pub enum AuthRequestType {
    Challenge = 0,
    Response = 1,
}
