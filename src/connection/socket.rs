// src/connection/socket.rs

//! `Socket`: the send half of a framed TCP stream plus the `send_mutex` that
//! serializes concurrent writers (§3, §5: "per-socket send_mutex, never held
//! across recv"). Grounded on the teacher's `server/stream.rs` `AnyStream`
//! wrapper shape, simplified to plain TCP since TLS is a non-goal here.

use futures::SinkExt;
use futures::stream::SplitSink;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;

use crate::core::errors::CerverError;
use crate::core::protocol::{Packet, PacketCodec};

/// Owns the write half of a connection's framed stream. The read half is
/// exclusively polled by the connection's own task (see
/// `connection::handler::run`), so only the send side needs serialization:
/// built-in handlers, queued-handler workers, and the reader task itself (for
/// error replies) may all want to write concurrently.
pub struct Socket {
    sink: Mutex<SplitSink<Framed<TcpStream, PacketCodec>, Packet>>,
}

impl Socket {
    pub fn new(sink: SplitSink<Framed<TcpStream, PacketCodec>, Packet>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Sends one packet, holding `send_mutex` only for the duration of the
    /// write — never across a `recv`, per the lock-order table in §5.
    pub async fn send(&self, packet: Packet) -> Result<(), CerverError> {
        let mut sink = self.sink.lock().await;
        sink.send(packet).await
    }
}
