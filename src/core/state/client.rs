// src/core/state/client.rs

//! `Client`: a logical peer, identified by a unique id, owning a set of
//! connections. Grounded on the teacher's `core/state/client.rs`
//! (`ClientMap = Arc<DashMap<u64, ClientStateTuple>>`) for the registry
//! shape; fields restated from SPEC_FULL.md §3's Client row.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

pub type ClientId = u64;
pub type ConnectionId = u64;

#[derive(Debug, Default)]
pub struct ClientStats {
    pub packets_received: AtomicU64,
    pub packets_sent: AtomicU64,
}

/// A logical peer: an ordered set of live connections, an optional session
/// id, and user data. The connection set and session id are the only
/// frequently-mutated fields, so only they sit behind a lock; the id and
/// creation time are immutable after construction.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub created_at: DateTime<Utc>,
    pub session_id: Mutex<Option<String>>,
    connections: Mutex<Vec<ConnectionId>>,
    pub stats: ClientStats,
}

impl Client {
    pub(crate) fn new(id: ClientId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            session_id: Mutex::new(None),
            connections: Mutex::new(Vec::new()),
            stats: ClientStats::default(),
        }
    }

    /// Builds a standalone `Client` that never enters the main
    /// `ClientRegistry` — used by the admin plane, which keeps admins in
    /// `AdminRegistry` under their own id namespace instead (§3: an Admin
    /// "owns" a `Client` but is itself the registry entry).
    pub(crate) fn standalone(id: ClientId, conn_id: ConnectionId) -> Arc<Self> {
        let client = Arc::new(Self::new(id));
        client.add_connection(conn_id);
        client
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.lock().clone()
    }

    pub(crate) fn add_connection(&self, conn_id: ConnectionId) {
        self.connections.lock().push(conn_id);
    }

    /// Removes `conn_id` from this client's connection set and reports
    /// whether the client is now empty (i.e. should be unregistered).
    pub(crate) fn remove_connection(&self, conn_id: ConnectionId) -> bool {
        let mut conns = self.connections.lock();
        conns.retain(|&id| id != conn_id);
        conns.is_empty()
    }
}

/// The Cerver's client registry. Enforces the invariant "a Client exists in
/// the registry iff it has >= 1 live connection" by removing the client in
/// the same step that drops its last connection.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<Client>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a brand-new client owning a single connection, as happens on
    /// every accept (§4.3). Returns the new `Client`.
    pub fn register_new(&self, conn_id: ConnectionId) -> Arc<Client> {
        let id = self.next_client_id();
        let client = Arc::new(Client::new(id));
        client.add_connection(conn_id);
        self.clients.insert(id, client.clone());
        client
    }

    pub fn get(&self, client_id: ClientId) -> Option<Arc<Client>> {
        self.clients.get(&client_id).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drops `conn_id` from `client_id`'s connection set; if that was the
    /// client's last connection, unregisters it and returns `true` (the
    /// caller should then run the user-data deleter and fire
    /// `ClientCloseConnection`).
    pub fn unregister_connection(&self, client_id: ClientId, conn_id: ConnectionId) -> bool {
        let now_empty = match self.clients.get(&client_id) {
            Some(entry) => entry.value().remove_connection(conn_id),
            None => return false,
        };
        if now_empty {
            self.clients.remove(&client_id);
        }
        now_empty
    }

    pub fn all_client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|e| *e.key()).collect()
    }
}
