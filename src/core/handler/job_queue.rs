// src/core/handler/job_queue.rs

//! The per-handler job queue a non-direct `Handler` enqueues onto and a
//! single worker task drains (§4.5). `has_jobs` is a counting semaphore
//! standing in for the original's condition-variable-guarded queue: its
//! permit count is, by construction, always equal to the number of
//! undrained jobs plus (during teardown) one extra "wake and exit" permit.
//!
//! The queue is bounded (§3 Data Model: "a bounded job queue (FIFO)"):
//! `push` refuses past `capacity` rather than growing unboundedly, per §7's
//! "full job queue (backpressure: producer logs and drops the packet)".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::HandlerContext;
use crate::core::protocol::Packet;

pub struct Job {
    pub ctx: HandlerContext,
    pub packet: Packet,
}

pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    has_jobs: Semaphore,
    draining: AtomicBool,
    capacity: usize,
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            has_jobs: Semaphore::new(0),
            draining: AtomicBool::new(false),
            capacity: capacity.max(1),
        }
    }

    /// Enqueues `job` unless the queue is already at `capacity`, in which
    /// case it is refused (the caller logs and bumps the dropped-packet
    /// counter, per §7) and never reaches `has_jobs`.
    #[must_use]
    pub fn push(&self, job: Job) -> bool {
        let mut jobs = self.jobs.lock();
        if jobs.len() >= self.capacity {
            return false;
        }
        jobs.push_back(job);
        drop(jobs);
        self.has_jobs.add_permits(1);
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Waits for a job, or for a drain signal with nothing left to hand
    /// back. `None` only ever means the latter: every `push` supplies
    /// exactly one permit for the job it enqueues, and `begin_drain` adds
    /// exactly one extra permit, so a permit acquired with an empty queue
    /// can only be that drain signal.
    pub async fn pop(&self) -> Option<Job> {
        let permit = self.has_jobs.acquire().await.ok()?;
        permit.forget();
        self.jobs.lock().pop_front()
    }

    /// Marks the queue as draining and wakes the one worker parked in
    /// `pop`, so it can observe an empty queue, see `is_draining`, and
    /// exit rather than block forever.
    pub fn begin_drain(&self) {
        self.draining.store(true, Ordering::SeqCst);
        self.has_jobs.add_permits(1);
    }
}
