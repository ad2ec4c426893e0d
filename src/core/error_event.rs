// src/core/error_event.rs

//! The error-event table (§4.7, §7): a parallel table to `core::events`,
//! keyed by `ErrorKind` instead of `Event`. Grounded directly on
//! `examples/original_source/src/cerver/errors.c`'s
//! `cerver_error_event_register`/`cerver_error_event_unregister`/
//! `cerver_error_event_trigger`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::protocol::ErrorKind;
use crate::core::state::ClientId;

/// Payload handed to an error action, mirroring the original's
/// `CerverErrorEventData` (cerver/client/connection back-references plus the
/// carried message).
#[derive(Debug, Clone, Default)]
pub struct ErrorEventData {
    pub client_id: Option<ClientId>,
    pub error_message: Option<String>,
}

pub type ErrorAction = Arc<dyn Fn(ErrorEventData) + Send + Sync>;

struct Registration {
    action: ErrorAction,
    create_thread: bool,
    drop_after_trigger: bool,
}

const ERROR_KIND_COUNT: usize = 8;

fn kind_index(kind: ErrorKind) -> usize {
    kind as u32 as usize
}

/// Fixed-array-indexed error table, structurally identical to `EventTable`
/// but over the flat `ErrorKind` taxonomy from the error-handling design.
pub struct ErrorEventTable {
    slots: Mutex<[Option<Registration>; ERROR_KIND_COUNT]>,
}

impl Default for ErrorEventTable {
    fn default() -> Self {
        Self {
            slots: Mutex::new([const { None }; ERROR_KIND_COUNT]),
        }
    }
}

impl ErrorEventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &self,
        error_type: ErrorKind,
        action: F,
        create_thread: bool,
        drop_after_trigger: bool,
    ) where
        F: Fn(ErrorEventData) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        slots[kind_index(error_type)] = Some(Registration {
            action: Arc::new(action),
            create_thread,
            drop_after_trigger,
        });
    }

    pub fn unregister(&self, error_type: ErrorKind) {
        let mut slots = self.slots.lock();
        slots[kind_index(error_type)] = None;
    }

    pub fn trigger(&self, error_type: ErrorKind, data: ErrorEventData) {
        let triggered = {
            let slots = self.slots.lock();
            slots[kind_index(error_type)]
                .as_ref()
                .map(|reg| (reg.action.clone(), reg.create_thread, reg.drop_after_trigger))
        };

        let Some((action, create_thread, drop_after_trigger)) = triggered else {
            debug!(?error_type, "no action registered for error event");
            return;
        };

        if create_thread {
            tokio::spawn(async move {
                action(data);
            });
        } else {
            action(data);
        }

        if drop_after_trigger {
            self.unregister(error_type);
        }
    }
}
