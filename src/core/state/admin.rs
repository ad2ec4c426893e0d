// src/core/state/admin.rs

//! The admin plane's own registry, structurally parallel to
//! `core::state::client` but privilege-scoped and capacity-bounded. Grounded
//! on `examples/original_source/src/cerver/admin.c`
//! (`admin_cerver_register_admin`/`admin_cerver_unregister_admin`,
//! `max_admins`/`max_admin_connections`).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;

use crate::core::state::client::{Client, ClientId, ConnectionId};
use crate::core::CerverError;

pub type AdminId = String;

/// An authenticated admin-plane peer. Owns a `Client` (its connection set)
/// plus the admin-specific bookkeeping the original keeps on `Admin`:
/// an authenticated flag and a per-connection bad-packet counter used to
/// drop abusive admin connections.
#[derive(Debug)]
pub struct Admin {
    pub id: AdminId,
    pub client: Arc<Client>,
    pub authenticated: std::sync::atomic::AtomicBool,
    pub bad_packets: AtomicU32,
}

impl Admin {
    fn new(id: AdminId, client: Arc<Client>) -> Self {
        Self {
            id,
            client,
            authenticated: std::sync::atomic::AtomicBool::new(false),
            bad_packets: AtomicU32::new(0),
        }
    }

    pub fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Returns `true` if this connection crossed `n_bad_packets_limit` and
    /// should be dropped.
    pub fn record_bad_packet(&self, limit: u32) -> bool {
        self.bad_packets.fetch_add(1, Ordering::SeqCst) + 1 >= limit
    }
}

/// Bounds and bookkeeping for the admin plane, restated from the original's
/// `max_admins` (distinct authenticated admins) and `max_admin_connections`
/// (total live connections across the admin plane, including
/// not-yet-authenticated ones).
pub struct AdminRegistry {
    admins: DashMap<AdminId, Arc<Admin>>,
    total_connections: AtomicU64,
    max_admins: usize,
    max_admin_connections: usize,
    n_bad_packets_limit: u32,
    next_client_id: AtomicU64,
    next_connection_id: AtomicU64,
}

impl AdminRegistry {
    pub fn new(max_admins: usize, max_admin_connections: usize, n_bad_packets_limit: u32) -> Self {
        Self {
            admins: DashMap::new(),
            total_connections: AtomicU64::new(0),
            max_admins,
            max_admin_connections,
            n_bad_packets_limit,
            next_client_id: AtomicU64::new(1),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// The admin plane keeps its own `Client`/connection id namespaces,
    /// separate from the main `ClientRegistry`'s, since admins never enter
    /// that registry (§3: Admin owns a Client but is addressed by its own
    /// `AdminId`, not a `ClientId` shared with regular peers).
    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn n_bad_packets_limit(&self) -> u32 {
        self.n_bad_packets_limit
    }

    /// Generates an admin id as `<unix_millis>-<random suffix>`, matching
    /// the spec's literal wording ("timestamp + random suffix") without
    /// reaching for a UUID the original doesn't use either. The suffix is
    /// six lowercase-alphanumeric characters drawn from `rand`, the same
    /// crate the `AUTH` challenge nonce uses elsewhere in `builtin.rs`.
    fn generate_id(&self) -> AdminId {
        const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        const SUFFIX_LEN: usize = 6;
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        format!("{}-{}", Utc::now().timestamp_millis(), suffix)
    }

    /// Reserves a connection slot on the admin plane ahead of authentication,
    /// mirroring `admin_cerver_poll_register_connection`'s capacity check
    /// happening before the handshake completes.
    pub fn reserve_connection(&self) -> Result<(), CerverError> {
        loop {
            let current = self.total_connections.load(Ordering::SeqCst);
            if current as usize >= self.max_admin_connections {
                return Err(CerverError::AdminConnectionsFull);
            }
            if self
                .total_connections
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    pub fn release_connection(&self) {
        self.total_connections.fetch_sub(1, Ordering::SeqCst);
    }

    /// Promotes a reserved connection into a registered `Admin` once
    /// authentication succeeds. Fails with `AdminsFull` if `max_admins`
    /// distinct admins are already registered.
    pub fn register_admin(&self, conn_id: ConnectionId, client: Arc<Client>) -> Result<Arc<Admin>, CerverError> {
        if self.admins.len() >= self.max_admins {
            return Err(CerverError::AdminsFull);
        }
        let id = self.generate_id();
        let admin = Arc::new(Admin::new(id.clone(), client));
        admin.mark_authenticated();
        self.admins.insert(id, admin.clone());
        let _ = conn_id;
        Ok(admin)
    }

    pub fn unregister_admin(&self, admin_id: &AdminId) {
        self.admins.remove(admin_id);
    }

    /// Drops `conn_id` from `admin_id`'s connection set; if that was the
    /// admin's last connection, unregisters it. Mirrors
    /// `ClientRegistry::unregister_connection`'s same-critical-section
    /// removal, scoped to the admin plane.
    pub fn unregister_connection(&self, admin_id: &AdminId, conn_id: ConnectionId) -> bool {
        let now_empty = match self.admins.get(admin_id) {
            Some(entry) => entry.value().client.remove_connection(conn_id),
            None => return false,
        };
        if now_empty {
            self.admins.remove(admin_id);
        }
        now_empty
    }

    pub fn get(&self, admin_id: &AdminId) -> Option<Arc<Admin>> {
        self.admins.get(admin_id).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    pub fn all_admin_ids(&self) -> Vec<AdminId> {
        self.admins.iter().map(|e| e.key().clone()).collect()
    }

    /// Broadcasts are the caller's responsibility (it holds the send path);
    /// this just hands back every registered admin's backing `Client` so the
    /// caller can fan a packet out to each connection, matching
    /// `admin_cerver_broadcast_to_admins`.
    pub fn all_admin_clients(&self) -> Vec<(AdminId, Arc<Client>)> {
        self.admins
            .iter()
            .map(|e| (e.key().clone(), e.value().client.clone()))
            .collect()
    }
}
