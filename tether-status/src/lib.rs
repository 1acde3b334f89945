//! Liveness reporting and remote access for registered components.
//!
//! A [`StatusService`] keeps a directory of external address →
//! component. Attached to an [`Endpoint`](tether_transport::Endpoint) it
//! runs one heartbeat task that announces [`Status::Ready`] for every
//! registration each interval, and [`Status::Terminated`] once when the
//! endpoint stops. Deregistering sends TERMINATED immediately.
//!
//! Attaching also installs remote commands on the endpoint:
//!
//! | Command | Arguments | Effect |
//! |---------|-----------|--------|
//! | `set` | address, value... | Write the parameter at `address` |
//! | `get` | address | Send the parameter's description to `address` |
//! | `list` | component address | Send one description per parameter |
//! | `components` | | Send the registered addresses |
//!
//! [`Status::Ready`]: tether_core::Status::Ready
//! [`Status::Terminated`]: tether_core::Status::Terminated

#![deny(missing_docs)]

pub mod directory;
pub mod service;

pub use directory::{Registration, StatusDirectory};
pub use service::StatusService;
