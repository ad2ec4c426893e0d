// src/server/admin_loop.rs

//! The admin plane's own accept loop: structurally parallel to
//! `connection_loop::run`'s accept arm, but run as one of the background
//! tasks `spawner::spawn_all` spawns rather than the process's main loop,
//! since only the client plane's loop owns the process-wide shutdown
//! sequence. Scoped to whichever `TcpListener` `initialization::setup`
//! bound when `config.admin.enabled`.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::connection::run_connection;
use crate::core::state::CerverState;

pub async fn run(cerver: Arc<CerverState>, listener: TcpListener, shutdown_tx: broadcast::Sender<()>) {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut tasks = JoinSet::new();

    loop {
        if !cerver.is_running() {
            break;
        }
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => break,

            res = listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!(%addr, "admin connection accepted");
                        let cerver = cerver.clone();
                        let conn_shutdown_rx = shutdown_tx.subscribe();
                        tasks.spawn(run_connection(cerver, socket, addr, true, conn_shutdown_rx));
                    }
                    Err(e) => error!(error = %e, "admin listener accept failed"),
                }
            }

            Some(res) = tasks.join_next() => {
                if let Err(e) = res && e.is_panic() {
                    error!("admin connection task panicked: {e:?}");
                }
            }
        }
    }

    tasks.shutdown().await;
}
