// src/server/builder.rs

//! The embedder-facing entry point (§6): a `Cerver` is constructed by
//! registering per-type handlers, event/error actions, and (for the admin
//! plane) an `authenticate` callback onto a `Config` before anything is
//! bound or started — exactly the "setters, all before `start`" shape the
//! spec describes, expressed as a consuming builder rather than a sequence
//! of mutating setter calls on a handle. `main.rs` itself never needs these
//! (the shipped binary carries only the built-in handlers), but any
//! embedder linking against this crate as a library does.

use anyhow::Result;

use super::context::ServerContext;
use super::initialization::{self, HandlerOverrides};
use super::BoundCerver;
use crate::config::Config;
use crate::core::error_event::ErrorAction;
use crate::core::events::{Event, EventAction};
use crate::core::handler::{AuthenticateFn, Handler};
use crate::core::protocol::{ErrorKind, PacketType};
use crate::core::updates::UpdateAction;

/// Builds a `Cerver` from a validated `Config` plus whatever the embedder
/// wants layered on top of the built-in `CERVER`/`AUTH` handlers: `APP`,
/// `APP_ERROR`, and `CUSTOM` handlers are the ones every embedder supplies
/// (§4.4 leaves them unregistered in `core::handler::builtin`); event/error
/// hooks and the admin `authenticate` callback are optional.
#[derive(Default)]
pub struct CerverBuilder {
    config: Config,
    overrides: HandlerOverrides,
}

impl CerverBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            overrides: HandlerOverrides::default(),
        }
    }

    /// Registers (or replaces) the client-plane handler for `packet_type`.
    /// Typically used for `APP`/`APP_ERROR`/`CUSTOM`, though nothing stops
    /// an embedder from overriding the built-in `CERVER` handler too.
    pub fn client_handler(mut self, packet_type: PacketType, handler: Handler) -> Self {
        self.overrides.client_handlers.push((packet_type, handler));
        self
    }

    /// Registers (or replaces) the admin-plane handler for `packet_type`.
    /// Has no effect unless `config.admin.enabled`.
    pub fn admin_handler(mut self, packet_type: PacketType, handler: Handler) -> Self {
        self.overrides.admin_handlers.push((packet_type, handler));
        self
    }

    /// Installs the admin plane's authentication callback, checked by the
    /// built-in `AUTH` handshake (§4.3). Has no effect unless
    /// `config.admin.enabled`.
    pub fn admin_authenticate(mut self, authenticate: AuthenticateFn) -> Self {
        self.overrides.admin_authenticate = Some(authenticate);
        self
    }

    /// Registers an action for a client-plane lifecycle event (§4.7).
    /// `create_thread` spawns the action on a detached task instead of
    /// running it inline; `drop_after_trigger` unregisters it after its
    /// first firing.
    pub fn on_event(mut self, event: Event, action: EventAction, create_thread: bool, drop_after_trigger: bool) -> Self {
        self.overrides.client_events.push((event, action, create_thread, drop_after_trigger));
        self
    }

    /// Registers an action for a client-plane error event (§4.7/§7).
    pub fn on_error(mut self, kind: ErrorKind, action: ErrorAction, create_thread: bool, drop_after_trigger: bool) -> Self {
        self.overrides.client_errors.push((kind, action, create_thread, drop_after_trigger));
        self
    }

    /// Registers an action for an admin-plane lifecycle event. Has no
    /// effect unless `config.admin.enabled`.
    pub fn on_admin_event(mut self, event: Event, action: EventAction, create_thread: bool, drop_after_trigger: bool) -> Self {
        self.overrides.admin_events.push((event, action, create_thread, drop_after_trigger));
        self
    }

    /// Registers an action for an admin-plane error event. Has no effect
    /// unless `config.admin.enabled`.
    pub fn on_admin_error(mut self, kind: ErrorKind, action: ErrorAction, create_thread: bool, drop_after_trigger: bool) -> Self {
        self.overrides.admin_errors.push((kind, action, create_thread, drop_after_trigger));
        self
    }

    /// Registers the §4.8 "update" callable, fired `ticks_per_second` times
    /// a second. Has no effect unless `config.update` is also set — setting
    /// the cadence and supplying the action are independent steps, matching
    /// the spec's "optional" periodic-update threads.
    pub fn update_action(mut self, action: UpdateAction<()>) -> Self {
        self.overrides.update_action = Some(action);
        self
    }

    /// Registers the §4.8 "interval" callable, fired once every
    /// `config.interval.seconds`. Has no effect unless `config.interval` is
    /// also set.
    pub fn interval_action(mut self, action: UpdateAction<()>) -> Self {
        self.overrides.interval_action = Some(action);
        self
    }

    /// Binds the listener(s) and assembles `CerverState`, without spawning
    /// any background task or accepting a single connection yet.
    pub async fn bind(self) -> Result<BoundCerver> {
        let ctx: ServerContext = initialization::setup(self.config, self.overrides).await?;
        BoundCerver::from_context(ctx)
    }

    /// Binds and then drives the cerver to completion, equivalent to
    /// `self.bind().await?.serve().await`.
    pub async fn run(self) -> Result<()> {
        self.bind().await?.serve().await;
        Ok(())
    }
}
