// src/core/handler/builtin.rs

//! The handlers every cerver carries out of the box (§4.4): `CERVER`
//! ping/teardown-notify/report, `ERROR` routing on both planes, `AUTH`
//! challenge/response on the admin plane, and generic `REQUEST`/`GAME`
//! acknowledgement. `APP`/`APP_ERROR`/`CUSTOM` stay unregistered here —
//! they're the embedder's to fill in. `ERROR` is grounded on
//! `examples/original_source/src/cerver/errors.c`'s
//! `cerver_error_packet_handler` (switch on the decoded `error_type`, call
//! `cerver_error_event_trigger`); the admin handshake and the
//! `CERVER_TEARDOWN` notify are grounded on `admin.c`'s
//! `admin_cerver_handlers_end`/auth-then-promote flow. Neither file (nor any
//! other file in the pack) implements `PING`/`REPORT` or a `REQUEST`/`GAME`
//! handler body, so those are restated directly from §4.4's built-in list
//! with no file-level counterpart to point at.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use rand::RngCore;
use tracing::{info, warn};

use super::{Handler, HandlerContext, HandlerFn, HandlerTable};
use crate::core::error_event::ErrorEventData;
use crate::core::events::{Event, EventData};
use crate::core::metrics::gather_metrics;
use crate::core::protocol::{AuthRequestType, CerverRequestType, ErrorKind, Packet, PacketType};

const AUTH_NONCE_LEN: usize = 16;

fn boxed(f: impl Fn(HandlerContext, Packet) -> BoxFuture<'static, ()> + Send + Sync + 'static) -> HandlerFn {
    Arc::new(f)
}

/// `CERVER` packets: `Ping` is answered with a `Ping` back, `TeardownNotify`
/// asks this connection's own reader task to close, `Report` replies with
/// the current prometheus text exposition — the only place metrics leave
/// the process, since there is no HTTP surface here.
fn cerver_handler() -> HandlerFn {
    boxed(|ctx, packet| {
        Box::pin(async move {
            let Packet::Cerver { request_type, .. } = packet else {
                return;
            };
            match CerverRequestType::from_repr(request_type) {
                Some(CerverRequestType::Ping) => {
                    let reply = Packet::Cerver {
                        request_type: CerverRequestType::Ping as u32,
                        payload: Bytes::new(),
                    };
                    if let Err(e) = ctx.connection.socket.send(reply).await {
                        warn!(error = %e, "failed to send ping reply");
                    }
                }
                Some(CerverRequestType::TeardownNotify) => {
                    info!(connection_id = ctx.connection.id, "teardown notify received");
                    ctx.connection.request_drop();
                }
                Some(CerverRequestType::Report) => {
                    let report = gather_metrics();
                    let reply = Packet::Cerver {
                        request_type: CerverRequestType::Report as u32,
                        payload: Bytes::from(report.into_bytes()),
                    };
                    if let Err(e) = ctx.connection.socket.send(reply).await {
                        warn!(error = %e, "failed to send report reply");
                    }
                }
                None => {
                    warn!(request_type, "unknown cerver request type");
                }
            }
        })
    })
}

/// `ERROR` packets (§4.4: "`ERROR`, `AUTH`, `REQUEST`, `GAME` have built-in
/// handlers"): decodes the carried `ErrorPayload` and routes it through the
/// error-event table, exactly as the original's `cerver_error_packet_handler`
/// switches on `s_error->error_type` and calls `cerver_error_event_trigger`.
fn error_handler() -> HandlerFn {
    boxed(|ctx, packet| {
        Box::pin(async move {
            let Packet::Error(payload) = packet else {
                return;
            };
            if payload.error_type == ErrorKind::None {
                return;
            }
            let error_events = if ctx.connection.is_admin {
                match ctx.cerver.admin() {
                    Some(admin) => &admin.error_events,
                    None => return,
                }
            } else {
                &ctx.cerver.error_events
            };
            error_events.trigger(
                payload.error_type,
                ErrorEventData {
                    client_id: Some(ctx.connection.client.id),
                    error_message: Some(payload.message),
                },
            );
        })
    })
}

/// `REQUEST` packets (§4.4: built in on both planes): acknowledged by
/// echoing the same request type and payload back to the sender. No file in
/// the pack implements a `PACKET_TYPE_REQUEST` body — the original leaves
/// the type for embedder-defined request/response protocols — so this is
/// the minimal built-in the spec's classification requires rather than
/// falling through to `CerverError::NoHandler` like an unregistered type.
fn request_handler() -> HandlerFn {
    boxed(|ctx, packet| {
        Box::pin(async move {
            let Packet::Request { request_type, payload } = packet else {
                return;
            };
            let reply = Packet::Request { request_type, payload };
            if let Err(e) = ctx.connection.socket.send(reply).await {
                warn!(error = %e, "failed to send request ack");
            }
        })
    })
}

/// `GAME` packets (§4.4: built in on both planes): same generic
/// acknowledgement as `REQUEST`, restated over the `Game` variant. Grounding
/// is identical — no pack file defines `PACKET_TYPE_GAME` behavior.
fn game_handler() -> HandlerFn {
    boxed(|ctx, packet| {
        Box::pin(async move {
            let Packet::Game { request_type, payload } = packet else {
                return;
            };
            let reply = Packet::Game { request_type, payload };
            if let Err(e) = ctx.connection.socket.send(reply).await {
                warn!(error = %e, "failed to send game ack");
            }
        })
    })
}

/// `AUTH` packets, admin plane only: `Challenge` hands back a fresh nonce,
/// `Response` checks the embedder's `authenticate` callback and, on
/// success, promotes this connection to a registered `Admin`.
fn auth_handler() -> HandlerFn {
    boxed(|ctx, packet| {
        Box::pin(async move {
            let Packet::Auth { request_type, payload } = packet else {
                return;
            };
            match AuthRequestType::from_repr(request_type) {
                Some(AuthRequestType::Challenge) => {
                    let mut nonce = BytesMut::zeroed(AUTH_NONCE_LEN);
                    rand::thread_rng().fill_bytes(&mut nonce);
                    let nonce = nonce.freeze();
                    ctx.connection.set_auth_nonce(nonce.clone());
                    let reply = Packet::Auth {
                        request_type: AuthRequestType::Challenge as u32,
                        payload: nonce,
                    };
                    if let Err(e) = ctx.connection.socket.send(reply).await {
                        warn!(error = %e, "failed to send auth challenge");
                    }
                }
                Some(AuthRequestType::Response) => {
                    handle_auth_response(&ctx, payload).await;
                }
                None => {
                    warn!(request_type, "unknown auth request type");
                }
            }
        })
    })
}

async fn handle_auth_response(ctx: &HandlerContext, payload: Bytes) {
    let Some(admin_state) = ctx.cerver.admin() else {
        warn!("auth response received but admin plane is disabled");
        return;
    };

    let authenticated = admin_state
        .authenticate
        .as_ref()
        .map(|check| check(&payload))
        .unwrap_or(false);

    if !authenticated {
        ctx.cerver.events.trigger(
            Event::ClientAuthFail,
            EventData {
                client_id: Some(ctx.connection.client.id),
                message: Some("admin authentication failed".to_string()),
            },
        );
        ctx.cerver.error_events.trigger(
            ErrorKind::FailedAuth,
            ErrorEventData {
                client_id: Some(ctx.connection.client.id),
                error_message: Some("admin authentication failed".to_string()),
            },
        );
        let reply = Packet::error(ErrorKind::FailedAuth, "authentication failed");
        let _ = ctx.connection.socket.send(reply).await;

        // §4.3: a rejected admin credential closes unconditionally, not
        // after N attempts — the bad-packet counter is still bumped for
        // telemetry, but it must never gate this drop.
        ctx.connection
            .record_bad_packet(admin_state.registry.n_bad_packets_limit());
        ctx.connection.request_drop();
        return;
    }

    match admin_state
        .registry
        .register_admin(ctx.connection.id, ctx.connection.client.clone())
    {
        Ok(admin) => {
            ctx.connection.set_admin_id(admin.id.clone());
            ctx.connection.mark_authenticated();
            ctx.cerver.events.trigger(
                Event::ClientAuthSuccess,
                EventData {
                    client_id: Some(ctx.connection.client.id),
                    message: None,
                },
            );
            let reply = Packet::Auth {
                request_type: AuthRequestType::Response as u32,
                payload: Bytes::from_static(b"OK"),
            };
            let _ = ctx.connection.socket.send(reply).await;
        }
        Err(e) => {
            warn!(error = %e, "admin registration failed");
            let reply = Packet::error(e.kind(), e.to_string());
            let _ = ctx.connection.socket.send(reply).await;
            ctx.connection.request_drop();
        }
    }
}

/// Builds the client-plane handler table with `CERVER`, `ERROR`, `REQUEST`,
/// and `GAME` populated — the full built-in set §4.4 names ("`ERROR`,
/// `AUTH`, `REQUEST`, `GAME` have built-in handlers"), `AUTH` excepted since
/// the handshake only makes sense on the admin plane. `APP`/`APP_ERROR`/
/// `CUSTOM` are left for the embedder (or, in this binary, simply
/// unregistered — packets of those types are answered with
/// `CerverError::NoHandler`).
pub fn install_client_handlers() -> HandlerTable {
    let mut table = HandlerTable::new();
    table.register(PacketType::Cerver, Handler::direct(cerver_handler()));
    table.register(PacketType::Error, Handler::direct(error_handler()));
    table.register(PacketType::Request, Handler::direct(request_handler()));
    table.register(PacketType::Game, Handler::direct(game_handler()));
    table
}

/// Builds the admin-plane handler table: `CERVER` (so `PING`/`REPORT` work
/// once authenticated), `ERROR`, `AUTH` (the handshake itself), and the same
/// `REQUEST`/`GAME` built-ins as the client plane.
pub fn install_admin_handlers() -> HandlerTable {
    let mut table = HandlerTable::new();
    table.register(PacketType::Cerver, Handler::direct(cerver_handler()));
    table.register(PacketType::Error, Handler::direct(error_handler()));
    table.register(PacketType::Auth, Handler::direct(auth_handler()));
    table.register(PacketType::Request, Handler::direct(request_handler()));
    table.register(PacketType::Game, Handler::direct(game_handler()));
    table
}
