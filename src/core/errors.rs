// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
///
/// The variant set is the flat taxonomy from the error-handling design: every
/// recoverable condition maps to exactly one of these and flows through the
/// event/error tables in `core::events` as well as being returned directly
/// from fallible core operations. Using `thiserror` gives clean error
/// definitions and automatic `Display`/`Error` impls.
#[derive(Error, Debug)]
pub enum CerverError {
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("incomplete data in stream")]
    IncompleteData,

    #[error("packet error: {0}")]
    PacketError(String),

    /// A declared packet size outside `[HEADER_SIZE, MAX_PACKET_SIZE]`: the
    /// stream's framing can no longer be trusted to resynchronize, so
    /// unlike `PacketError` (raised after the codec has already sliced the
    /// offending frame off the buffer) this always drops the connection
    /// rather than bumping the bad-packet counter and continuing.
    #[error("framing error: {0}")]
    FramingFatal(String),

    #[error("header magic mismatch")]
    ErrMagic,

    #[error("header protocol version mismatch")]
    ErrVersion,

    #[error("authentication failed")]
    FailedAuth,

    #[error("error retrieving file: {0}")]
    GetFile(String),

    #[error("error sending file: {0}")]
    SendFile(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("failed to create worker thread")]
    CreateThread,

    #[error("readiness registry is full (max_n_fds reached)")]
    Full,

    #[error("job queue is full (capacity reached)")]
    QueueFull,

    #[error("no handler registered for packet type")]
    NoHandler,

    #[error("admin plane is at capacity")]
    AdminsFull,

    #[error("admin connection limit reached")]
    AdminConnectionsFull,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("unknown error")]
    Unknown,
}

// Manual Clone because `std::io::Error` is not cloneable; wrapped in an Arc
// for cheap, shared cloning.
impl Clone for CerverError {
    fn clone(&self) -> Self {
        match self {
            CerverError::Io(e) => CerverError::Io(Arc::clone(e)),
            CerverError::IncompleteData => CerverError::IncompleteData,
            CerverError::PacketError(s) => CerverError::PacketError(s.clone()),
            CerverError::FramingFatal(s) => CerverError::FramingFatal(s.clone()),
            CerverError::ErrMagic => CerverError::ErrMagic,
            CerverError::ErrVersion => CerverError::ErrVersion,
            CerverError::FailedAuth => CerverError::FailedAuth,
            CerverError::GetFile(s) => CerverError::GetFile(s.clone()),
            CerverError::SendFile(s) => CerverError::SendFile(s.clone()),
            CerverError::FileNotFound(s) => CerverError::FileNotFound(s.clone()),
            CerverError::CreateThread => CerverError::CreateThread,
            CerverError::Full => CerverError::Full,
            CerverError::QueueFull => CerverError::QueueFull,
            CerverError::NoHandler => CerverError::NoHandler,
            CerverError::AdminsFull => CerverError::AdminsFull,
            CerverError::AdminConnectionsFull => CerverError::AdminConnectionsFull,
            CerverError::Config(s) => CerverError::Config(s.clone()),
            CerverError::Internal(s) => CerverError::Internal(s.clone()),
            CerverError::Unknown => CerverError::Unknown,
        }
    }
}

impl PartialEq for CerverError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CerverError::Io(e1), CerverError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CerverError::PacketError(s1), CerverError::PacketError(s2)) => s1 == s2,
            (CerverError::FramingFatal(s1), CerverError::FramingFatal(s2)) => s1 == s2,
            (CerverError::GetFile(s1), CerverError::GetFile(s2)) => s1 == s2,
            (CerverError::SendFile(s1), CerverError::SendFile(s2)) => s1 == s2,
            (CerverError::FileNotFound(s1), CerverError::FileNotFound(s2)) => s1 == s2,
            (CerverError::Config(s1), CerverError::Config(s2)) => s1 == s2,
            (CerverError::Internal(s1), CerverError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for CerverError {
    fn from(e: std::io::Error) -> Self {
        CerverError::Io(Arc::new(e))
    }
}

/// Maps a `CerverError` onto the flat `ErrorKind` taxonomy used by the
/// error-event table (see `core::protocol::packet::ErrorKind`,
/// `core::error_event`).
impl CerverError {
    pub fn kind(&self) -> crate::core::protocol::ErrorKind {
        use crate::core::protocol::ErrorKind;
        match self {
            CerverError::PacketError(_)
            | CerverError::FramingFatal(_)
            | CerverError::ErrMagic
            | CerverError::ErrVersion => ErrorKind::PacketError,
            CerverError::FailedAuth => ErrorKind::FailedAuth,
            CerverError::GetFile(_) => ErrorKind::GetFile,
            CerverError::SendFile(_) => ErrorKind::SendFile,
            CerverError::FileNotFound(_) => ErrorKind::FileNotFound,
            CerverError::CreateThread => ErrorKind::CreateThread,
            _ => ErrorKind::Unknown,
        }
    }
}
