// src/lib.rs

pub mod config;
pub mod connection;
pub mod core;
pub mod server;

pub use crate::config::Config;
pub use crate::core::handler::{AuthenticateFn, Handler, HandlerContext, HandlerFn};
pub use crate::core::protocol::{Packet, PacketType};
pub use crate::core::state::CerverState;
pub use crate::server::{BoundCerver, CerverBuilder};
