// src/core/handler/worker.rs

//! The worker task behind a non-direct handler's `JobQueue`: pop, run the
//! handler body, repeat, until the queue starts draining and goes dry.
//! Exactly one worker runs per queued handler, which is what makes
//! `JobQueue::begin_drain`'s single extra permit sufficient to wake and
//! retire it.

use std::sync::Arc;

use tracing::debug;

use super::HandlerFn;
use super::job_queue::JobQueue;
use crate::core::metrics::JOB_QUEUE_DEPTH;

pub async fn run_worker(queue: Arc<JobQueue>, action: HandlerFn, packet_type_label: String) {
    loop {
        let Some(job) = queue.pop().await else {
            debug!(packet_type = %packet_type_label, "worker draining, queue empty, exiting");
            break;
        };
        JOB_QUEUE_DEPTH
            .with_label_values(&[&packet_type_label])
            .set(queue.len() as f64);
        action(job.ctx, job.packet).await;
    }
}
