// src/server/context.rs

//! Everything the main accept loop needs once setup has finished: the
//! shared `CerverState`, the client-plane listener, the optional
//! admin-plane listener, the shutdown broadcast sender every task
//! subscribes to, and the `JoinSet` of background tasks `spawner::spawn_all`
//! populates (worker pool, periodic updates, admin accept loop).

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::core::state::CerverState;
use crate::core::updates::UpdateAction;

pub struct ServerContext {
    pub cerver: Arc<CerverState>,
    pub listener: TcpListener,
    pub admin_listener: Option<TcpListener>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<()>,
    /// The embedder's §4.8 "update" callable, if `config.update` is set and
    /// `CerverBuilder::update_action` registered one; falls back to a no-op
    /// heartbeat in `spawner::spawn_all` otherwise.
    pub update_action: Option<UpdateAction<()>>,
    /// Same as `update_action`, for the "interval" cadence.
    pub interval_action: Option<UpdateAction<()>>,
}
