//! Single-process OSC control endpoint for tether.
//!
//! An [`Endpoint`] owns one inbound UDP listener, one outbound [`Sender`]
//! and one cooperative scheduler. [`Endpoint::start`] runs the caller's
//! primary task, every auxiliary task registered beforehand, and the
//! receive loop, all joined on a single task. Nothing is spawned, so
//! inbound messages are dispatched strictly in arrival order and no
//! handler ever overlaps another.
//!
//! Shutdown is cooperative: [`Endpoint::stop`] cancels a shared token and
//! each task is expected to notice and return. A task that never checks
//! [`TaskContext::is_running`] (or awaits [`TaskContext::stopped`]) keeps
//! the endpoint alive.
//!
//! Inbound messages addressed to the configured prefix, or to an immediate
//! child of it, go through the [`Caller`]. Everything else is logged and
//! dropped. Dispatch faults are logged; they end the endpoint only in
//! strict mode.

#![deny(missing_docs)]

pub mod caller;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod sender;

pub use caller::{Arity, Caller, string_arg};
pub use codec::Datagram;
pub use config::EndpointConfig;
pub use endpoint::{Endpoint, EndpointState, TaskContext, run_until_stopped};
pub use error::{CodecError, DispatchError, TransportError};
pub use sender::Sender;
