// src/core/readiness/mod.rs

//! The readiness registry (§4.2): a lock-guarded, fixed-capacity slot table
//! tracking which sockets a plane (client or admin) currently owns.
//!
//! Actual socket multiplexing is delegated to tokio's reactor — each
//! registered connection gets its own task reading from its `Framed`
//! stream, a faithful restatement of "wait for POLLIN, then read" on an
//! executor that already does readiness-based polling. What's kept here,
//! literally, is the thing the spec's testable invariants are actually
//! about: `current_n_fds`, `ErrFull`, and slot reuse after a drop. Slots are
//! keyed by `sock_fd`, the same informational connection identifier carried
//! in the wire header (`core::protocol::Header::sock_fd`), rather than the
//! OS-level file descriptor tokio keeps private.

use parking_lot::Mutex;

use crate::core::CerverError;

const FREE: i32 = -1;

struct Inner {
    slots: Vec<i32>,
    current_n_fds: usize,
}

/// A fixed-capacity `fds[0..max_n_fds]` array with sentinel `-1` marking a
/// free slot, matching §4.2's description verbatim.
pub struct ReadinessRegistry {
    inner: Mutex<Inner>,
    max_n_fds: usize,
}

impl ReadinessRegistry {
    pub fn new(max_n_fds: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: vec![FREE; max_n_fds],
                current_n_fds: 0,
            }),
            max_n_fds,
        }
    }

    pub fn max_n_fds(&self) -> usize {
        self.max_n_fds
    }

    pub fn current_n_fds(&self) -> usize {
        self.inner.lock().current_n_fds
    }

    /// Finds the first free slot and stores `sock_fd` there. Fails with
    /// `CerverError::Full` if every slot is occupied.
    pub fn register(&self, sock_fd: i32) -> Result<(), CerverError> {
        let mut inner = self.inner.lock();
        let Some(slot) = inner.slots.iter().position(|&s| s == FREE) else {
            return Err(CerverError::Full);
        };
        inner.slots[slot] = sock_fd;
        inner.current_n_fds += 1;
        Ok(())
    }

    /// Linear-scans for `sock_fd` and frees its slot. Idempotent:
    /// unregistering an id that isn't present (already dropped by a racing
    /// caller) is a no-op that returns `false`, matching the drop path's
    /// "first take of the lock wins, the second finds fd = -1" rule.
    pub fn unregister(&self, sock_fd: i32) -> bool {
        let mut inner = self.inner.lock();
        let Some(slot) = inner.slots.iter().position(|&s| s == sock_fd) else {
            return false;
        };
        inner.slots[slot] = FREE;
        inner.current_n_fds -= 1;
        true
    }

    pub fn is_registered(&self, sock_fd: i32) -> bool {
        self.inner.lock().slots.iter().any(|&s| s == sock_fd)
    }
}
