// src/server/connection_loop.rs

//! The client-plane accept loop and the process's shutdown sequence.
//! Grounded on the teacher's `connection_loop.rs`: a `tokio::select!`
//! biased toward `await_shutdown_signal`, racing socket accepts against a
//! `JoinSet` reaping finished connection tasks, followed by an orderly
//! teardown once the loop exits.

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::context::ServerContext;
use crate::connection::run_connection;
use crate::core::events::{Event, EventData};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
#[cfg(windows)]
use tokio::signal;

/// Waits for a shutdown signal based on the operating system: SIGINT/SIGTERM
/// on Unix, Ctrl+C on Windows.
async fn await_shutdown_signal() {
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    #[cfg(windows)]
    let mut ctrl_c = signal::ctrl_c().expect("failed to install Ctrl+C handler");

    tokio::select! {
        _ = async { #[cfg(unix)] { sigint.recv().await; info!("SIGINT received, initiating graceful shutdown"); } } => {},
        _ = async { #[cfg(unix)] { sigterm.recv().await; info!("SIGTERM received, initiating graceful shutdown"); } } => {},
        _ = async { #[cfg(windows)] { ctrl_c.await; info!("Ctrl-C received, initiating graceful shutdown"); } } => {},
    }
}

/// The process's main loop: accepts client-plane connections until a
/// shutdown signal arrives or `cerver.teardown()` is called from elsewhere,
/// then runs the teardown sequence (§4.6/§6: drain job queues, close every
/// connection, join every background task, fire `CerverTeardown`).
pub async fn run(mut ctx: ServerContext) {
    let mut client_tasks = JoinSet::new();

    loop {
        if !ctx.cerver.is_running() {
            break;
        }
        tokio::select! {
            biased;

            _ = await_shutdown_signal() => {
                ctx.cerver.teardown();
                break;
            }

            _ = ctx.cerver.await_teardown() => break,

            Some(res) = ctx.background_tasks.join_next() => {
                if let Err(e) = res && e.is_panic() {
                    error!("background task panicked: {e:?}");
                }
            }

            res = ctx.listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        info!(%addr, "connection accepted");
                        let cerver = ctx.cerver.clone();
                        let conn_shutdown_rx = ctx.shutdown_tx.subscribe();
                        client_tasks.spawn(run_connection(cerver, socket, addr, false, conn_shutdown_rx));
                    }
                    Err(e) => error!(error = %e, "listener accept failed"),
                }
            }

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res && e.is_panic() {
                    error!("client connection task panicked: {e:?}");
                }
            }
        }
    }

    info!("shutting down: signalling all tasks");
    ctx.cerver.teardown();
    let _ = ctx.shutdown_tx.send(());

    for queue in ctx.cerver.handlers.queues() {
        queue.begin_drain();
    }
    if let Some(admin) = ctx.cerver.admin() {
        for queue in admin.handlers.queues() {
            queue.begin_drain();
        }
    }

    client_tasks.shutdown().await;
    debug!("all client connections closed");

    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("timed out waiting for background tasks to finish cleanly");
    }

    ctx.cerver
        .events
        .trigger(Event::CerverTeardown, EventData::default());
    info!("server shutdown complete");
}
