// src/core/metrics.rs

//! Prometheus metrics for the quantities §8's testable properties already
//! care about: connections accepted/dropped, bad packets, job-queue depth,
//! admins connected, packets dispatched by type. Grounded on the teacher's
//! `core/metrics.rs` (module-level static registrations plus
//! `prometheus::register_*!` macros, `gather_metrics()` returning the text
//! encoding), metric names and set restated for cerver; the teacher's
//! `lazy_static!` macro is replaced with `once_cell::sync::Lazy` so the
//! crate carries one lazy-static-init primitive instead of two. There is no
//! HTTP `/metrics` route (HTTP exposure is out-of-core per spec §1):
//! `gather_metrics()` is read instead by the built-in admin `CERVER`/
//! `REPORT` handler (§4.4).

use once_cell::sync::Lazy;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, IntGauge, TextEncoder, register_counter,
    register_counter_vec, register_gauge, register_gauge_vec, register_int_gauge,
};

/// Clients currently registered in the cerver's client registry.
pub static CONNECTED_CLIENTS: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("cerver_connected_clients", "Number of currently connected clients.").unwrap());
/// Admins currently registered in the admin plane, if enabled.
pub static CONNECTED_ADMINS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("cerver_connected_admins", "Number of currently connected and authenticated admins.").unwrap()
});

/// Total connections accepted across both planes since startup.
pub static CONNECTIONS_RECEIVED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("cerver_connections_received_total", "Total number of connections accepted.").unwrap()
});
/// Total connections dropped (normal close, bad packets, auth failure, teardown).
pub static CONNECTIONS_DROPPED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("cerver_connections_dropped_total", "Total number of connections dropped.").unwrap()
});

/// Bad (malformed or failed-auth) packets received, labeled by plane.
pub static BAD_PACKETS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cerver_bad_packets_total",
        "Total number of bad packets received, labeled by plane.",
        &["plane"]
    )
    .unwrap()
});

/// Packets dispatched to a handler, labeled by packet type.
pub static PACKETS_DISPATCHED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cerver_packets_dispatched_total",
        "Total number of packets dispatched to a handler, labeled by packet type.",
        &["packet_type"]
    )
    .unwrap()
});
/// Packets dropped because no handler was registered for their type.
pub static PACKETS_DROPPED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "cerver_packets_dropped_total",
        "Total number of packets dropped due to a missing handler or full queue."
    )
    .unwrap()
});

/// Current depth of each non-direct handler's job queue, labeled by packet type.
pub static JOB_QUEUE_DEPTH: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "cerver_job_queue_depth",
        "Current number of undrained jobs in a handler's queue, labeled by packet type.",
        &["packet_type"]
    )
    .unwrap()
});

/// Number of fd slots currently occupied in a plane's readiness registry.
pub static READINESS_FDS_IN_USE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "cerver_readiness_fds_in_use",
        "Occupied slots in a plane's readiness registry, labeled by plane.",
        &["plane"]
    )
    .unwrap()
});

/// Process start time, exposed so the admin `report` handler can compute uptime.
pub static START_TIME_UNIX: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "cerver_start_time_seconds",
        "Unix timestamp at which the cerver process started."
    )
    .unwrap()
});

/// Gathers every registered metric and encodes it in the Prometheus text
/// format; this is the payload of a `CERVER`/`REPORT` reply packet (§4.4),
/// the one in-protocol exposure point for this registry.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
