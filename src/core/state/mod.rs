// src/core/state/mod.rs

//! Shared cerver state: the client and admin registries, the two planes'
//! readiness/handler tables, and the top-level `CerverState`/
//! `AdminCerverState` that everything else is handed an `Arc` to.

pub mod admin;
pub mod client;
mod core;

pub use admin::{Admin, AdminId, AdminRegistry};
pub use client::{Client, ClientId, ClientRegistry, ConnectionId};
pub use core::{AdminCerverState, CerverState, CerverStats};
