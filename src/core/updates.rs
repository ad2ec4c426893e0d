// src/core/updates.rs

//! Periodic update/interval tasks (§4.8): two optional per-plane background
//! tasks that invoke a shared user callable on a fixed cadence. Grounded on
//! the teacher's `server/spawner.rs` JoinSet-of-background-tasks pattern
//! (each maintenance task is a `tokio::select!` loop racing a shutdown
//! receiver against its own timer), restated around the spec's tick/interval
//! cadence instead of Redis's TTL/eviction/AOF maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::core::state::CerverState;

/// Shared context handed to every update/interval callable invocation,
/// mirroring the original's `CerverUpdate{cerver, args}`.
#[derive(Clone)]
pub struct CerverUpdate<A> {
    pub cerver: Arc<CerverState>,
    pub args: A,
}

pub type UpdateAction<A> = Arc<dyn Fn(CerverUpdate<A>) + Send + Sync>;

/// The frame-paced "update" task: fires `ticks_per_second` times a second.
/// `tokio::time::interval` with `MissedTickBehavior::Delay` is the async
/// restatement of "busy-sleep the remainder of each 1/N second" — it never
/// bursts to catch up on missed ticks, it just resumes the regular cadence.
pub async fn run_update_task<A>(
    cerver: Arc<CerverState>,
    ticks_per_second: u32,
    args: A,
    action: UpdateAction<A>,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    A: Clone + Send + 'static,
{
    let period = Duration::from_secs_f64(1.0 / ticks_per_second.max(1) as f64);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if !cerver.is_running() {
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                action(CerverUpdate { cerver: cerver.clone(), args: args.clone() });
            }
        }
    }
    debug!("update task exiting");
}

/// The "interval" task: fires once every `seconds`, skipping the immediate
/// first tick `tokio::time::interval` would otherwise deliver right away.
pub async fn run_interval_task<A>(
    cerver: Arc<CerverState>,
    seconds: u64,
    args: A,
    action: UpdateAction<A>,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    A: Clone + Send + 'static,
{
    let mut ticker = interval(Duration::from_secs(seconds.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        if !cerver.is_running() {
            break;
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                action(CerverUpdate { cerver: cerver.clone(), args: args.clone() });
            }
        }
    }
    debug!("interval task exiting");
}
