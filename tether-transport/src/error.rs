//! Transport, dispatch and codec errors.

use std::net::SocketAddr;

use tether_core::{AddressError, BoxError, ConfigError, ParameterError};
use thiserror::Error;

use crate::caller::Arity;
use crate::endpoint::EndpointState;

/// Wire encoding and decoding failures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a valid OSC packet.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The message could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The packet was a bundle. Bundles are not supported.
    #[error("bundles are not supported")]
    Bundle,
}

/// Faults raised while decoding and invoking an inbound message.
///
/// These are caught at the dispatch boundary and logged; in strict mode
/// they stop the endpoint.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The datagram could not be decoded.
    #[error(transparent)]
    Decode(#[from] CodecError),

    /// The message carried no operation name.
    #[error("message has no operation name")]
    MissingOperation,

    /// No command is registered under this name.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// The command was called with the wrong number of arguments.
    #[error("operation '{operation}' expects {expected} argument(s), got {got}")]
    ArgumentCount {
        /// The operation name.
        operation: String,
        /// What the command accepts.
        expected: Arity,
        /// How many arguments arrived.
        got: usize,
    },

    /// An argument had the wrong shape.
    #[error("invalid argument to '{operation}': {reason}")]
    InvalidArgument {
        /// The operation name.
        operation: String,
        /// What was wrong.
        reason: String,
    },

    /// A parameter write failed.
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// An address did not resolve.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Any other command failure.
    #[error("command failed: {0}")]
    Failed(#[source] BoxError),
}

/// Endpoint lifecycle and socket failures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The inbound listener could not be bound.
    #[error("could not bind listener on {address}: {source}")]
    Bind {
        /// The requested listen address.
        address: SocketAddr,
        /// The socket error.
        #[source]
        source: std::io::Error,
    },

    /// The outbound socket could not be created.
    #[error("could not open sender socket: {0}")]
    Sender(#[source] std::io::Error),

    /// The runtime for a blocking run could not be built.
    #[error("could not build runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The process received an interrupt (Ctrl-C).
    #[error("terminated by interrupt")]
    Interrupted,

    /// The call is only valid in another lifecycle state.
    #[error("endpoint is {actual}, expected {expected}")]
    InvalidState {
        /// The state the call requires.
        expected: EndpointState,
        /// The state the endpoint is in.
        actual: EndpointState,
    },

    /// A dispatch fault escalated in strict mode.
    #[error("dispatch fault: {0}")]
    Dispatch(#[from] DispatchError),
}
