// src/server/initialization.rs

//! Builds everything `connection_loop::run` needs before it can start
//! accepting: the handler/event tables, the `CerverState` aggregate, and
//! the listening socket(s). Grounded on the teacher's `initialization.rs`
//! `setup()` (log the resolved config, build state, bind the listener,
//! return a context) with the Redis-specific persistence/cluster/TLS steps
//! dropped — there is nothing in SPEC_FULL.md's core for them to load.

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

use super::context::ServerContext;
use crate::config::Config;
use crate::core::error_event::{ErrorAction, ErrorEventTable};
use crate::core::events::{Event, EventAction, EventTable};
use crate::core::handler::builtin::{install_admin_handlers, install_client_handlers};
use crate::core::handler::{AuthenticateFn, Handler};
use crate::core::protocol::{ErrorKind, PacketType};
use crate::core::state::CerverState;
use crate::core::updates::UpdateAction;

/// Every embedder-registerable addition to the built-in tables
/// `core::handler::builtin` installs: `APP`/`APP_ERROR`/`CUSTOM` handlers
/// (and, if the embedder wants, overrides of the built-ins), event/error
/// hooks, and the admin plane's `authenticate` callback. Built by
/// `CerverBuilder`, consumed once by `setup`.
#[derive(Default)]
pub struct HandlerOverrides {
    pub client_handlers: Vec<(PacketType, Handler)>,
    pub admin_handlers: Vec<(PacketType, Handler)>,
    pub client_events: Vec<(Event, EventAction, bool, bool)>,
    pub client_errors: Vec<(ErrorKind, ErrorAction, bool, bool)>,
    pub admin_events: Vec<(Event, EventAction, bool, bool)>,
    pub admin_errors: Vec<(ErrorKind, ErrorAction, bool, bool)>,
    pub admin_authenticate: Option<AuthenticateFn>,
    /// The §4.8 "update" callable, registered via `CerverBuilder::update_action`.
    /// Only runs if `config.update` is also set; falls back to a no-op
    /// heartbeat in `spawner::spawn_all` when the embedder hasn't supplied one.
    pub update_action: Option<UpdateAction<()>>,
    /// The §4.8 "interval" callable, registered via `CerverBuilder::interval_action`.
    pub interval_action: Option<UpdateAction<()>>,
}

/// Initializes all server components before the accept loop starts.
pub async fn setup(config: Config, overrides: HandlerOverrides) -> Result<ServerContext> {
    log_startup_info(&config);

    let (shutdown_tx, _) = broadcast::channel(1);

    let mut client_handlers = install_client_handlers();
    for (packet_type, handler) in overrides.client_handlers {
        client_handlers.register(packet_type, handler);
    }
    let client_events = EventTable::new();
    for (event, action, create_thread, drop_after_trigger) in overrides.client_events {
        client_events.register(event, move |data| action(data), create_thread, drop_after_trigger);
    }
    let client_error_events = ErrorEventTable::new();
    for (kind, action, create_thread, drop_after_trigger) in overrides.client_errors {
        client_error_events.register(kind, move |data| action(data), create_thread, drop_after_trigger);
    }

    let (admin_handlers, admin_events, admin_error_events) = if config.admin.enabled {
        let mut handlers = install_admin_handlers();
        for (packet_type, handler) in overrides.admin_handlers {
            handlers.register(packet_type, handler);
        }
        let events = EventTable::new();
        for (event, action, create_thread, drop_after_trigger) in overrides.admin_events {
            events.register(event, move |data| action(data), create_thread, drop_after_trigger);
        }
        let error_events = ErrorEventTable::new();
        for (kind, action, create_thread, drop_after_trigger) in overrides.admin_errors {
            error_events.register(kind, move |data| action(data), create_thread, drop_after_trigger);
        }
        (Some(handlers), Some(events), Some(error_events))
    } else {
        (None, None, None)
    };

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(host = %config.host, port = config.port, "cerver listening");

    let admin_listener = if config.admin.enabled {
        let listener = TcpListener::bind((config.admin.host.as_str(), config.admin.port)).await?;
        info!(host = %config.admin.host, port = config.admin.port, "admin plane listening");
        Some(listener)
    } else {
        None
    };

    let cerver = CerverState::initialize(
        config,
        client_handlers,
        client_events,
        client_error_events,
        admin_handlers,
        admin_events,
        admin_error_events,
        overrides.admin_authenticate,
    )?;

    Ok(ServerContext {
        cerver,
        listener,
        admin_listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
        update_action: overrides.update_action,
        interval_action: overrides.interval_action,
    })
}

fn log_startup_info(config: &Config) {
    info!(
        name = %config.name,
        worker_pool_size = config.worker_pool_size,
        max_n_fds = config.max_n_fds,
        admin_enabled = config.admin.enabled,
        "starting cerver"
    );
    if let Some(msg) = &config.welcome_message {
        info!(welcome_message = %msg);
    }
}
