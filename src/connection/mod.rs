// src/connection/mod.rs

//! Manages the lifecycle of a single TCP connection: the framed read loop,
//! the per-connection state machine (§4.9), and the RAII cleanup that runs
//! on drop regardless of which path ended the connection.

pub mod connection;
pub mod guard;
pub mod handler;
pub mod socket;

pub use connection::{Connection, ConnectionState};
pub use guard::ConnectionGuard;
pub use handler::run_connection;
pub use socket::Socket;
