// src/server/mod.rs

//! Orchestrates the three setup phases into one `run()` entry point, the
//! way the teacher's `server/mod.rs` does: build state and bind sockets
//! (`initialization::setup`), spawn every background task
//! (`spawner::spawn_all`), then hand control to the main accept loop
//! (`connection_loop::run`), which owns the process until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::core::state::CerverState;

mod admin_loop;
mod builder;
mod connection_loop;
mod context;
mod initialization;
mod spawner;

pub use builder::CerverBuilder;

/// Runs a cerver to completion with only the built-in handlers installed
/// (§4.4's `CERVER`/`AUTH`) — the shape `main.rs` uses. An embedder wanting
/// `APP`/`CUSTOM` handlers, event hooks, or admin authentication wires them
/// up through `CerverBuilder` instead.
pub async fn run(config: Config) -> Result<()> {
    CerverBuilder::new(config).run().await
}

/// A cerver whose sockets are already bound but whose accept loop hasn't
/// started yet. `bind()` splits `run()` in two so an embedder (or an
/// integration test) can learn the real listening address — useful with
/// `config.port = 0` for an OS-assigned ephemeral port — and obtain the
/// shared `CerverState` before handing control to `serve()`.
pub struct BoundCerver {
    pub cerver: Arc<CerverState>,
    pub local_addr: SocketAddr,
    pub admin_local_addr: Option<SocketAddr>,
    ctx: context::ServerContext,
}

impl BoundCerver {
    /// Resolves handlers/config and binds the listener(s), without spawning
    /// any background task or accepting a single connection yet. Installs
    /// only the built-in handlers; use `CerverBuilder::bind` to add `APP`
    /// handlers, event hooks, or admin authentication first.
    pub async fn bind(config: Config) -> Result<Self> {
        CerverBuilder::new(config).bind().await
    }

    pub(super) fn from_context(ctx: context::ServerContext) -> Result<Self> {
        let local_addr = ctx.listener.local_addr()?;
        let admin_local_addr = match &ctx.admin_listener {
            Some(listener) => Some(listener.local_addr()?),
            None => None,
        };

        Ok(Self {
            cerver: ctx.cerver.clone(),
            local_addr,
            admin_local_addr,
            ctx,
        })
    }

    /// Spawns every background task and drives the accept loop to
    /// completion. Consumes `self`, so callers must clone `cerver` (and read
    /// `local_addr`/`admin_local_addr`) beforehand — exactly the fields
    /// `bind()` returns alongside the bound-but-not-yet-serving instance.
    pub async fn serve(mut self) {
        spawner::spawn_all(&mut self.ctx);
        connection_loop::run(self.ctx).await;
    }
}
