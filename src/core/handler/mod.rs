// src/core/handler/mod.rs

//! Per-packet-type dispatch (§4.4): a fixed-size, array-indexed table of
//! handlers (grounded on the "handlers-by-enum" design note in §9, the same
//! shape as `core::events::EventTable`), plus the `Dispatcher` that routes a
//! decoded `Packet` to its registered `Handler`, either inline on the
//! connection's own task (`direct`) or onto a per-handler `JobQueue` drained
//! by a dedicated worker task (queued).

pub mod builtin;
pub mod job_queue;
pub mod worker;

use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use tracing::warn;

use crate::connection::connection::Connection;
use crate::core::errors::CerverError;
use crate::core::protocol::{Packet, PacketType};
use crate::core::state::CerverState;
use job_queue::{Job, JobQueue};

/// Everything a handler body needs: the shared cerver state (for registries,
/// event tables, metrics, the optional admin sub-state) and the connection
/// the packet arrived on.
#[derive(Clone)]
pub struct HandlerContext {
    pub cerver: Arc<CerverState>,
    pub connection: Arc<Connection>,
}

pub type HandlerFn = Arc<dyn Fn(HandlerContext, Packet) -> BoxFuture<'static, ()> + Send + Sync>;

/// One registered handler. `direct` handlers run inline on the connection's
/// read loop — appropriate for cheap, order-sensitive work like `CERVER`
/// built-ins. Non-direct handlers enqueue a `Job` onto `queue` instead, so a
/// slow handler body can't stall that connection's ability to keep reading
/// (§4.5); a worker task owns draining that queue.
pub struct Handler {
    action: HandlerFn,
    queue: Option<Arc<JobQueue>>,
}

impl Handler {
    pub fn direct(action: HandlerFn) -> Self {
        Self {
            action,
            queue: None,
        }
    }

    /// Builds a non-direct handler backed by a `JobQueue` bounded at
    /// `capacity` (typically `Config::job_queue_capacity`).
    pub fn queued(action: HandlerFn, capacity: usize) -> (Self, Arc<JobQueue>) {
        let queue = Arc::new(JobQueue::new(capacity));
        (
            Self {
                action,
                queue: Some(queue.clone()),
            },
            queue,
        )
    }

    pub fn is_direct(&self) -> bool {
        self.queue.is_none()
    }

    pub fn action(&self) -> HandlerFn {
        self.action.clone()
    }
}

/// A fixed array of `Option<Handler>` indexed by `PacketType::index()`,
/// mirroring `EventTable`/`ErrorEventTable`'s array-over-hashmap choice:
/// there are only `PacketType::COUNT` possible keys, known at compile time.
pub struct HandlerTable {
    slots: [Option<Handler>; PacketType::COUNT],
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            slots: [const { None }; PacketType::COUNT],
        }
    }

    /// Registers `handler` for `packet_type`, replacing any previous
    /// registration. Intended to be called only during setup, before the
    /// cerver starts accepting connections.
    pub fn register(&mut self, packet_type: PacketType, handler: Handler) {
        self.slots[packet_type.index()] = Some(handler);
    }

    pub fn get(&self, packet_type: PacketType) -> Option<&Handler> {
        self.slots[packet_type.index()].as_ref()
    }

    /// Every queue belonging to a registered, non-direct handler — used at
    /// teardown to drain them all.
    pub fn queues(&self) -> Vec<Arc<JobQueue>> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().and_then(|h| h.queue.clone()))
            .collect()
    }

    /// Every `(PacketType, action, queue)` triple belonging to a registered,
    /// non-direct handler — used at startup to spawn exactly one worker task
    /// per queue (§4.5: one worker per queued handler).
    pub fn queued_handlers(&self) -> Vec<(PacketType, HandlerFn, Arc<JobQueue>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let handler = slot.as_ref()?;
                let queue = handler.queue.clone()?;
                let packet_type = PacketType::from_u32(i as u32)?;
                Some((packet_type, handler.action(), queue))
            })
            .collect()
    }
}

pub struct Dispatcher;

impl Dispatcher {
    /// Routes `packet` through `table` according to its packet type. Bumps
    /// `PACKETS_DISPATCHED_TOTAL`/`PACKETS_DROPPED_TOTAL` and returns
    /// `CerverError::NoHandler` when nothing is registered, so the caller can
    /// fold that into the same bad-packet accounting as a malformed frame.
    pub async fn dispatch(
        table: &HandlerTable,
        ctx: HandlerContext,
        packet: Packet,
    ) -> Result<(), CerverError> {
        let packet_type = packet.packet_type();
        let label = format!("{packet_type:?}");
        match table.get(packet_type) {
            Some(handler) if handler.is_direct() => {
                crate::core::metrics::PACKETS_DISPATCHED_TOTAL
                    .with_label_values(&[&label])
                    .inc();
                (handler.action())(ctx, packet).await;
                Ok(())
            }
            Some(handler) => {
                let queue = handler.queue.clone().expect("non-direct handler has a queue");
                if queue.push(Job { ctx, packet }) {
                    crate::core::metrics::PACKETS_DISPATCHED_TOTAL
                        .with_label_values(&[&label])
                        .inc();
                    Ok(())
                } else {
                    // §7: a full job queue is recovered locally by logging
                    // and dropping the packet, not by blocking the reader.
                    crate::core::metrics::PACKETS_DROPPED_TOTAL.inc();
                    warn!(?packet_type, capacity = queue.capacity(), "job queue full, dropping packet");
                    Err(CerverError::QueueFull)
                }
            }
            None => {
                crate::core::metrics::PACKETS_DROPPED_TOTAL.inc();
                warn!(?packet_type, "no handler registered for packet type");
                Err(CerverError::NoHandler)
            }
        }
    }
}

pub type AuthenticateFn = Arc<dyn Fn(&Bytes) -> bool + Send + Sync>;
