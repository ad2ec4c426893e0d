// src/connection/guard.rs

//! `ConnectionGuard`: RAII cleanup for the drop path (§4.6). Kept near the
//! teacher's `connection/guard.rs` shape (a guard constructed once a
//! connection is fully registered, torn down on `Drop`), adapted from the
//! teacher's single client map to cerver's two registries (client plane,
//! admin plane) and its readiness registries.
//!
//! `Drop` is synchronous, so every registry it touches
//! (`ReadinessRegistry`, `ClientRegistry`, `AdminRegistry`) is built on
//! `parking_lot`/`dashmap` rather than async locks — exactly the
//! constraint that shaped those types in the first place.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::debug;

use super::connection::Connection;
use crate::core::events::{Event, EventData};
use crate::core::metrics;
use crate::core::state::CerverState;

pub struct ConnectionGuard {
    cerver: Arc<CerverState>,
    connection: Arc<Connection>,
}

impl ConnectionGuard {
    /// Constructed only after the connection's fd has been registered with
    /// its plane's `ReadinessRegistry` — the guard's job is solely to undo
    /// that registration (and everything downstream of it) exactly once.
    pub fn new(cerver: Arc<CerverState>, connection: Arc<Connection>) -> Self {
        Self { cerver, connection }
    }
}

impl Drop for ConnectionGuard {
    /// Idempotent against concurrent duplicate drops of the same fd (§4.6):
    /// `ReadinessRegistry::unregister`/`*Registry::unregister_connection`
    /// both already tolerate "not present" by construction, so a second
    /// `Drop` of an already-cleaned-up connection is simply a no-op here.
    fn drop(&mut self) {
        let conn = &self.connection;
        let sock_fd = conn.id as i32;

        if conn.is_admin {
            let Some(admin_state) = self.cerver.admin() else {
                return;
            };
            admin_state.readiness.unregister(sock_fd);
            admin_state.registry.release_connection();
            if let Some(admin_id) = conn.admin_id() {
                admin_state.registry.unregister_connection(&admin_id, conn.id);
            }
            metrics::READINESS_FDS_IN_USE
                .with_label_values(&["admin"])
                .set(admin_state.readiness.current_n_fds() as f64);
            metrics::CONNECTED_ADMINS.set(admin_state.registry.len() as f64);
            debug!(connection_id = conn.id, "admin connection dropped");
        } else {
            self.cerver.readiness.unregister(sock_fd);
            self.cerver
                .clients
                .unregister_connection(conn.client.id, conn.id);
            metrics::READINESS_FDS_IN_USE
                .with_label_values(&["client"])
                .set(self.cerver.readiness.current_n_fds() as f64);
            metrics::CONNECTED_CLIENTS.set(self.cerver.clients.len() as f64);
            debug!(connection_id = conn.id, "client connection dropped");
        }

        metrics::CONNECTIONS_DROPPED_TOTAL.inc();
        self.cerver.stats.connections_dropped.fetch_add(1, Ordering::Relaxed);
        self.cerver.events.trigger(
            Event::ClientCloseConnection,
            EventData {
                client_id: Some(conn.client.id),
                message: None,
            },
        );
    }
}
