#![deny(missing_docs)]
//! # tether: umbrella crate
//!
//! A single import surface for remote-controlled parameter trees.
//! Re-exports the member crates behind feature flags, plus a `prelude`
//! for the happy path.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! let gain = Parameter::new("gain", 0.5);
//! let mixer = Arc::new(Node::new("mixer").with(&gain));
//!
//! let endpoint = Endpoint::new(EndpointConfig::default())?;
//! let status = StatusService::for_endpoint(&endpoint);
//! status.register_default("/mixer", mixer)?;
//! status.attach(&endpoint)?;
//! endpoint.run(run_until_stopped)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use tether_core;
#[cfg(feature = "status")]
pub use tether_status;
#[cfg(feature = "transport")]
pub use tether_transport;

#[cfg(feature = "logging")]
mod logging;
#[cfg(feature = "logging")]
pub use logging::init_logging;

/// Happy-path imports for building a controllable process.
pub mod prelude {
    pub use tether_core::{
        AddressError, AnyParameter, Child, Component, ConfigError, Node, NominalRange, NumericRange,
        ParamType, Parameter, ParameterError, Parsable, Registry, Renderable, RenderedMessage,
        SearchFlags, Status, ValidationError, address_to_path, path_to_address, status_address,
    };

    #[cfg(feature = "transport")]
    pub use tether_transport::{
        Arity, DispatchError, Endpoint, EndpointConfig, Sender, TaskContext, TransportError,
        run_until_stopped,
    };

    #[cfg(feature = "status")]
    pub use tether_status::StatusService;
}
