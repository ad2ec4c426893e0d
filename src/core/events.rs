// src/core/events.rs

//! The event table (§4.7): a fixed enum of lifecycle events, each with at most
//! one registered action. Grounded on the original C implementation's
//! `cerver_error_event_register`/`cerver_error_event_trigger` (see
//! `examples/original_source/src/cerver/errors.c`), restated for the success
//! event table; the parallel error table lives in `core::error_event`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::state::ClientId;

/// The fixed set of lifecycle events an embedder can hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::FromRepr)]
#[repr(u32)]
pub enum Event {
    CerverStarted = 0,
    CerverTeardown = 1,
    ClientConnected = 2,
    ClientCloseConnection = 3,
    ClientAuthSuccess = 4,
    ClientAuthFail = 5,
}

impl Event {
    pub const COUNT: usize = 6;

    fn index(self) -> usize {
        self as u32 as usize
    }
}

/// Payload handed to an event action. Freshly constructed per trigger, as the
/// original's `CerverErrorEventData` is freshly allocated per trigger.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    pub client_id: Option<ClientId>,
    pub message: Option<String>,
}

/// An embedder-supplied callback. Boxed and reference-counted so it can be
/// cloned out of the table before being invoked outside the lock (inline) or
/// moved onto a detached task (`create_thread`).
pub type EventAction = Arc<dyn Fn(EventData) + Send + Sync>;

struct Registration {
    action: EventAction,
    create_thread: bool,
    drop_after_trigger: bool,
}

/// Fixed-size-array-indexed event table (design note "handlers-by-enum").
/// `register` installs at most one action per event; re-registration
/// replaces the previous one, matching `cerver_error_event_register`'s
/// "search if there is an action already registered ... and remove it".
pub struct EventTable {
    slots: Mutex<[Option<Registration>; Event::COUNT]>,
}

impl Default for EventTable {
    fn default() -> Self {
        Self {
            slots: Mutex::new([const { None }; Event::COUNT]),
        }
    }
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &self,
        event: Event,
        action: F,
        create_thread: bool,
        drop_after_trigger: bool,
    ) where
        F: Fn(EventData) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        slots[event.index()] = Some(Registration {
            action: Arc::new(action),
            create_thread,
            drop_after_trigger,
        });
    }

    pub fn unregister(&self, event: Event) {
        let mut slots = self.slots.lock();
        slots[event.index()] = None;
    }

    /// Triggers the action registered for `event`, if any. Inline actions run
    /// on the caller's task; `create_thread` actions are moved onto a
    /// detached `tokio::spawn`.
    pub fn trigger(&self, event: Event, data: EventData) {
        let triggered = {
            let slots = self.slots.lock();
            slots[event.index()]
                .as_ref()
                .map(|reg| (reg.action.clone(), reg.create_thread, reg.drop_after_trigger))
        };

        let Some((action, create_thread, drop_after_trigger)) = triggered else {
            debug!(?event, "no action registered for event");
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
            self.unregister(event);
        }
    }
}
