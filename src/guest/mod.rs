//! The guest runtime shim.
//!
//! A compiled plugin links against this module inside the sandboxed host.
//! During its load phase the plugin registers handlers with
//! [`GuestRuntime::on`]; the host then asks [`GuestRuntime::describe`] which
//! event types to forward, and delivers each event through
//! [`GuestRuntime::handle`]. Outgoing requests go through
//! [`GuestRuntime::call`].
//!
//! The host delivers events to one instance strictly one at a time, so the
//! runtime holds its registry by value and takes `&mut self` to dispatch.
//! There is no locking.

use crate::error::HandlerError;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

mod abi;
mod call;
mod event;
mod registry;

pub use abi::{ErrorCode, Subsystem};
pub use call::{Host, RecordingHost};
pub use event::{
    CallFailure, CommandInteraction, HostCall, HostEvent, MemberEvent, Message, MessageData,
    MessageDeleted, Reaction, User, WireMessage,
};
pub use registry::{BoxError, EventRegistry, Handler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestState {
    Uninitialized,
    Ready,
}

/// The answer to [`GuestRuntime::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub events: Vec<String>,
}

/// The answer to one event delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleResult {
    pub success: bool,
}

impl HandleResult {
    pub const OK: HandleResult = HandleResult { success: true };
    pub const FAILED: HandleResult = HandleResult { success: false };
}

/// One guest instance.
pub struct GuestRuntime<H: Host> {
    host: H,
    registry: EventRegistry,
    state: GuestState,
}

impl<H: Host> GuestRuntime<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            registry: EventRegistry::new(),
            state: GuestState::Uninitialized,
        }
    }

    pub fn state(&self) -> GuestState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn ready(&mut self) {
        if self.state == GuestState::Uninitialized {
            debug!("guest runtime ready");
            self.state = GuestState::Ready;
        }
    }

    /// Registers `handler` for `event_type`. Handlers accumulate; registering
    /// the same type twice runs both handlers, in registration order.
    pub fn on<F>(&mut self, event_type: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&HostEvent) -> Result<(), BoxError> + 'static,
    {
        self.ready();
        self.registry.register(event_type.into(), Box::new(handler));
        self
    }

    /// The declared event types, in first-registration order.
    pub fn describe(&mut self) -> Description {
        self.ready();
        Description {
            events: self.registry.declared_events().to_vec(),
        }
    }

    /// Runs every handler registered for the event's type, in registration
    /// order. The first handler to fail or panic ends the dispatch.
    pub fn handle(&mut self, event: &HostEvent) -> HandleResult {
        let event_type = event.event_type();
        let Some(handlers) = self.registry.handlers_mut(event_type) else {
            return HandleResult::OK;
        };

        for (position, handler) in handlers.iter_mut().enumerate() {
            if let Err(e) = run_handler(handler, event) {
                error!(event_type, handler = position, error = %e, "event handler failed");
                return HandleResult::FAILED;
            }
        }
        HandleResult::OK
    }

    /// Decodes a `{type, data}` message and dispatches it.
    ///
    /// The payload is only decoded into a typed event when a handler is
    /// registered for its type; unhandled types succeed whatever they carry.
    pub fn handle_json(&mut self, message: &[u8]) -> HandleResult {
        let decoded = serde_json::from_slice::<WireMessage>(message).and_then(|wire| {
            if self.registry.handlers_mut(&wire.kind).is_none() {
                return Ok(None);
            }
            HostEvent::from_wire(wire).map(Some)
        });
        match decoded {
            Ok(Some(event)) => self.handle(&event),
            Ok(None) => HandleResult::OK,
            Err(e) => {
                let e = HandlerError::MalformedEvent(e.to_string());
                error!(error = %e, "rejecting host event");
                HandleResult::FAILED
            }
        }
    }

    /// Sends `call` to the host without waiting for any answer.
    pub fn call(&self, call: &HostCall) {
        match call.to_json() {
            Ok(bytes) => self.host.call(&bytes),
            Err(e) => warn!(error = %e, "dropping host call that failed to serialize"),
        }
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for GuestRuntime<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestRuntime")
            .field("host", &self.host)
            .field("registry", &self.registry)
            .field("state", &self.state)
            .finish()
    }
}

fn run_handler(handler: &mut Handler, event: &HostEvent) -> Result<(), HandlerError> {
    let event_type = event.event_type().to_string();
    match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(HandlerError::Failed { event_type, source }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HandlerError::Panicked {
                event_type,
                message,
            })
        }
    }
}
