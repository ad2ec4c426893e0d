// src/connection/handler.rs

//! `run_connection`: the per-connection task. One is spawned per accepted
//! socket, on either plane; it owns the `Framed` read half, drives the
//! accept-time registration dance (§4.3), and runs the dispatch loop until
//! shutdown, a drop request, or a fatal framing/IO error ends it. Grounded
//! on the teacher's `connection/handler.rs::run` (`tokio::select!` over a
//! shutdown receiver and `framed.next()`, `is_normal_disconnect` for quiet
//! logging of ordinary peer hangups) with the command-routing body replaced
//! by `core::handler::Dispatcher::dispatch`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::guard::ConnectionGuard;
use super::socket::Socket;
use crate::core::errors::CerverError;
use crate::core::events::{Event, EventData};
use crate::core::error_event::ErrorEventData;
use crate::core::handler::{Dispatcher, HandlerContext};
use crate::core::metrics;
use crate::core::protocol::{Packet, PacketCodec};
use crate::core::state::CerverState;
use crate::core::state::client::Client;

/// Runs one connection end to end: registration, dispatch loop, and
/// (via `ConnectionGuard`'s `Drop`) unregistration, on whichever plane
/// `is_admin` selects.
pub async fn run_connection(
    cerver: Arc<CerverState>,
    stream: TcpStream,
    addr: SocketAddr,
    is_admin: bool,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let _ = stream.set_nodelay(true);

    let receive_buffer_size = cerver.config.receive_buffer_size;
    let check_packets = cerver.config.check_packets;
    let codec = PacketCodec::new(receive_buffer_size, check_packets);
    let framed = Framed::new(stream, codec);
    let (sink, mut read_half) = framed.split();
    let socket = Socket::new(sink);

    let plane = if is_admin { "admin" } else { "client" };

    let (client, conn_id, bad_packets_limit) = if is_admin {
        let Some(admin_state) = cerver.admin() else {
            warn!("admin connection accepted but admin plane is disabled");
            return;
        };
        if let Err(e) = admin_state.registry.reserve_connection() {
            debug!(%addr, error = %e, "admin connection refused: plane at capacity");
            return;
        }
        let conn_id = admin_state.next_connection_id();
        let client_id = admin_state.next_client_id();
        let client = Client::standalone(client_id, conn_id);
        (client, conn_id, admin_state.registry.n_bad_packets_limit())
    } else {
        let conn_id = cerver.next_connection_id();
        let client = cerver.clients.register_new(conn_id);
        (client, conn_id, cerver.config.n_bad_packets_limit)
    };

    let (connection, mut drop_rx) = Connection::new(conn_id, addr, socket, client.clone(), is_admin);

    let registry = if is_admin {
        &cerver.admin().expect("checked above").readiness
    } else {
        &cerver.readiness
    };
    if let Err(e) = registry.register(conn_id as i32) {
        warn!(%addr, error = %e, "readiness registry full, refusing connection");
        if is_admin {
            cerver.admin().expect("checked above").registry.release_connection();
        } else {
            cerver.clients.unregister_connection(client.id, conn_id);
        }
        return;
    }
    metrics::READINESS_FDS_IN_USE
        .with_label_values(&[plane])
        .set(registry.current_n_fds() as f64);

    let guard = ConnectionGuard::new(cerver.clone(), connection.clone());
    metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
    cerver.stats.connections_received.fetch_add(1, Ordering::Relaxed);
    if is_admin {
        metrics::CONNECTED_ADMINS.set(cerver.admin().expect("checked above").registry.len() as f64);
    } else {
        metrics::CONNECTED_CLIENTS.set(cerver.clients.len() as f64);
    }

    cerver.events.trigger(
        Event::ClientConnected,
        EventData {
            client_id: Some(client.id),
            message: None,
        },
    );
    info!(%addr, connection_id = conn_id, plane, "connection accepted");

    let table = if is_admin {
        &cerver.admin().expect("checked above").handlers
    } else {
        &cerver.handlers
    };
    let error_events = if is_admin {
        &cerver.admin().expect("checked above").error_events
    } else {
        &cerver.error_events
    };

    loop {
        if !cerver.is_running() {
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                debug!(connection_id = conn_id, "connection task received shutdown signal");
                break;
            }
            _ = drop_rx.recv() => {
                debug!(connection_id = conn_id, "connection task received drop request");
                break;
            }
            frame = read_half.next() => {
                match frame {
                    Some(Ok(packet)) => {
                        connection.touch();
                        let ctx = HandlerContext {
                            cerver: cerver.clone(),
                            connection: connection.clone(),
                        };
                        let _ = Dispatcher::dispatch(table, ctx, packet).await;
                    }
                    Some(Err(CerverError::FramingFatal(reason))) => {
                        warn!(connection_id = conn_id, %reason, "fatal framing error, dropping connection");
                        let _ = connection
                            .socket
                            .send(Packet::error(crate::core::protocol::ErrorKind::PacketError, reason.clone()))
                            .await;
                        error_events.trigger(
                            crate::core::protocol::ErrorKind::PacketError,
                            ErrorEventData {
                                client_id: Some(client.id),
                                error_message: Some(reason),
                            },
                        );
                        break;
                    }
                    Some(Err(e)) => {
                        metrics::BAD_PACKETS_TOTAL.with_label_values(&[plane]).inc();
                        let kind = e.kind();
                        let _ = connection.socket.send(Packet::error(kind, e.to_string())).await;
                        error_events.trigger(
                            kind,
                            ErrorEventData {
                                client_id: Some(client.id),
                                error_message: Some(e.to_string()),
                            },
                        );
                        if connection.record_bad_packet(bad_packets_limit) {
                            warn!(connection_id = conn_id, "bad packet limit reached, dropping connection");
                            break;
                        }
                    }
                    None => {
                        debug!(connection_id = conn_id, "connection closed by peer");
                        break;
                    }
                }
            }
        }
    }

    drop(guard);
}
