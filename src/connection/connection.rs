// src/connection/connection.rs

//! `Connection` (§3): a socket plus per-connection state — auth flag,
//! bad-packet counter, last-activity timestamp, and the owning `Client`.
//! Shared (`Arc`) between its reader task (`connection::handler::run`) and
//! any queued-handler worker task that needs to write a reply or request a
//! drop, which is why its mutable fields are atomics/locks rather than
//! exclusive state. Grounded on SPEC_FULL.md §3's Connection row; no direct
//! teacher counterpart (the teacher folds this state into `ClientInfo` plus
//! ad hoc fields on `ConnectionHandler`), so the shape is restated fresh
//! from the spec.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::socket::Socket;
use crate::core::state::admin::AdminId;
use crate::core::state::client::{Client, ConnectionId};

/// A connection's place in the state machine (§4.9). `Authenticated` is only
/// ever reached via the `AUTH` built-in handler or the admin handshake;
/// plain client connections that never authenticate stay `Open` for their
/// whole life, which is fine — authentication is opt-in per handler wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Authenticated,
    Dropping,
}

pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub socket: Socket,
    pub client: Arc<Client>,
    /// `true` for connections accepted on the admin listener; selects which
    /// `HandlerTable` dispatch consults and which registry the drop path
    /// unregisters from.
    pub is_admin: bool,
    authenticated: AtomicBool,
    dropping: AtomicBool,
    bad_packets: AtomicU32,
    last_activity: Mutex<Instant>,
    drop_tx: mpsc::Sender<()>,
    /// Set once the `AUTH` built-in handler promotes this connection to a
    /// registered `Admin`; read by `ConnectionGuard` to know which
    /// `AdminRegistry` entry to tear down.
    admin_id: Mutex<Option<AdminId>>,
    /// The nonce this connection was last sent by the `AUTH` challenge
    /// handler, held until the matching response arrives.
    auth_nonce: Mutex<Option<Bytes>>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        socket: Socket,
        client: Arc<Client>,
        is_admin: bool,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (drop_tx, drop_rx) = mpsc::channel(1);
        let conn = Arc::new(Self {
            id,
            addr,
            socket,
            client,
            is_admin,
            authenticated: AtomicBool::new(false),
            dropping: AtomicBool::new(false),
            bad_packets: AtomicU32::new(0),
            last_activity: Mutex::new(Instant::now()),
            drop_tx,
            admin_id: Mutex::new(None),
            auth_nonce: Mutex::new(None),
        });
        (conn, drop_rx)
    }

    pub fn admin_id(&self) -> Option<AdminId> {
        self.admin_id.lock().clone()
    }

    pub fn set_admin_id(&self, id: AdminId) {
        *self.admin_id.lock() = Some(id);
    }

    pub fn take_auth_nonce(&self) -> Option<Bytes> {
        self.auth_nonce.lock().take()
    }

    pub fn set_auth_nonce(&self, nonce: Bytes) {
        *self.auth_nonce.lock() = Some(nonce);
    }

    pub fn state(&self) -> ConnectionState {
        if self.dropping.load(Ordering::SeqCst) {
            ConnectionState::Dropping
        } else if self.authenticated.load(Ordering::SeqCst) {
            ConnectionState::Authenticated
        } else {
            ConnectionState::Open
        }
    }

    pub fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    pub fn bad_packets(&self) -> u32 {
        self.bad_packets.load(Ordering::SeqCst)
    }

    /// Bumps the bad-packet counter and reports whether the limit was
    /// crossed (`>=`, per the uniform resolution of the open question in
    /// §9). The caller is responsible for acting on a `true` return by
    /// calling `request_drop`.
    pub fn record_bad_packet(&self, limit: u32) -> bool {
        self.bad_packets.fetch_add(1, Ordering::SeqCst) + 1 >= limit
    }

    /// Asks the connection's own reader task to tear the connection down.
    /// Idempotent: a full or closed channel is simply ignored, matching the
    /// "first take wins, second returns success" drop-path rule.
    pub fn request_drop(&self) {
        self.dropping.store(true, Ordering::SeqCst);
        let _ = self.drop_tx.try_send(());
    }
}
