// src/core/state/core.rs

//! `CerverState`/`AdminCerverState`: the two per-plane aggregates everything
//! else is handed an `Arc` to. Grounded on the shape of the original's
//! `Cerver`/`AdminCerver` structs (each owning its own poll/handler/registry
//! set, see `examples/original_source/src/cerver/admin.c`'s `AdminCerver`
//! layout), simplified to the one factory function a Rust binary actually
//! needs rather than the original's many setter calls before `cerver_start`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::Config;
use crate::core::blocking::BlockingPool;
use crate::core::error_event::ErrorEventTable;
use crate::core::errors::CerverError;
use crate::core::events::EventTable;
use crate::core::handler::{AuthenticateFn, HandlerTable};
use crate::core::readiness::ReadinessRegistry;
use crate::core::state::admin::AdminRegistry;
use crate::core::state::client::{ClientRegistry, ConnectionId};

/// Running totals surfaced through the built-in `CERVER`/`REPORT` handler
/// and the prometheus gauges in `core::metrics`.
#[derive(Debug)]
pub struct CerverStats {
    pub started_at: DateTime<Utc>,
    pub connections_received: AtomicU64,
    pub connections_dropped: AtomicU64,
}

impl Default for CerverStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            connections_received: AtomicU64::new(0),
            connections_dropped: AtomicU64::new(0),
        }
    }
}

/// The admin plane's own aggregate: its registry, its readiness registry,
/// its handler table, and the embedder-supplied authentication callback
/// (§4.4's `AUTH` challenge/response built-in calls into this). Exists only
/// when `config.admin.enabled`.
pub struct AdminCerverState {
    pub registry: AdminRegistry,
    pub readiness: ReadinessRegistry,
    pub handlers: HandlerTable,
    pub events: EventTable,
    pub error_events: ErrorEventTable,
    pub authenticate: Option<AuthenticateFn>,
    next_connection_id: AtomicU64,
}

impl AdminCerverState {
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// The central, `Arc`-shared cerver context: configuration, the client
/// registry and its readiness/handler/event tables, and an optional admin
/// sub-state. Handed to every connection task and background task.
pub struct CerverState {
    pub config: Config,
    pub clients: ClientRegistry,
    pub readiness: ReadinessRegistry,
    pub handlers: HandlerTable,
    pub events: EventTable,
    pub error_events: ErrorEventTable,
    pub stats: CerverStats,
    /// Backs §5's bounded blocking-work pool (`worker_pool_size`), for
    /// handler bodies that need to offload blocking work outside the
    /// packet-dispatch critical path. Independent of the per-handler
    /// `JobQueue` workers spawned in `server::spawner`.
    pub blocking: BlockingPool,
    running_tx: watch::Sender<bool>,
    next_connection_id: AtomicU64,
    admin: Option<Arc<AdminCerverState>>,
}

impl CerverState {
    /// Assembles the client plane (and, if enabled, the admin plane) from a
    /// validated `Config` plus the caller's pre-built handler/event tables.
    /// Tables are built before this call because registering a handler never
    /// needs a live `CerverState` — a `HandlerFn` only receives one at
    /// dispatch time, per packet (see `core::handler::HandlerContext`).
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        config: Config,
        handlers: HandlerTable,
        events: EventTable,
        error_events: ErrorEventTable,
        admin_handlers: Option<HandlerTable>,
        admin_events: Option<EventTable>,
        admin_error_events: Option<ErrorEventTable>,
        admin_authenticate: Option<AuthenticateFn>,
    ) -> Result<Arc<Self>, CerverError> {
        let readiness = ReadinessRegistry::new(config.max_n_fds);

        let admin = if config.admin.enabled {
            Some(Arc::new(AdminCerverState {
                registry: AdminRegistry::new(
                    config.admin.max_admins,
                    config.admin.max_admin_connections,
                    config.admin.n_bad_packets_limit,
                ),
                readiness: ReadinessRegistry::new(config.admin.max_n_fds),
                handlers: admin_handlers.unwrap_or_default(),
                events: admin_events.unwrap_or_default(),
                error_events: admin_error_events.unwrap_or_default(),
                authenticate: admin_authenticate,
                next_connection_id: AtomicU64::new(1),
            }))
        } else {
            None
        };

        let blocking = BlockingPool::new(config.worker_pool_size);

        Ok(Arc::new(Self {
            config,
            clients: ClientRegistry::new(),
            readiness,
            handlers,
            events,
            error_events,
            stats: CerverStats::default(),
            blocking,
            running_tx: watch::channel(true).0,
            next_connection_id: AtomicU64::new(1),
            admin,
        }))
    }

    pub fn admin(&self) -> Option<&Arc<AdminCerverState>> {
        self.admin.as_ref()
    }

    pub fn is_running(&self) -> bool {
        *self.running_tx.borrow()
    }

    /// Idempotent: a second call observes `running` already `false` and is a
    /// no-op, matching §6's "`teardown()` which is idempotent".
    pub fn teardown(&self) {
        self.running_tx.send_if_modified(|running| {
            let changed = *running;
            *running = false;
            changed
        });
    }

    /// Resolves once `teardown()` has been called, so the accept loop
    /// notices without waiting on an unrelated socket event or OS signal.
    /// Subscribing right before checking avoids the lost-wakeup a plain
    /// `Notify` would have if `teardown()` ran between the check and the
    /// wait: a new `watch::Receiver` always starts from the latest value.
    pub async fn await_teardown(&self) {
        let mut rx = self.running_tx.subscribe();
        while *rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}
