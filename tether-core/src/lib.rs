//! # tether-core: addressable control surfaces
//!
//! This crate defines the data side of a remote-controlled process: the
//! things a remote peer can address, read, write and watch. It has no
//! networking; `tether-transport` moves these values over the wire and
//! `tether-status` reports liveness about them.
//!
//! ## The Building Blocks
//!
//! | Concept | Type | What it does |
//! |---------|------|-------------|
//! | Parameter | [`Parameter`], [`AnyParameter`] | Checked value cell with change callback |
//! | Tree | [`Component`], [`Node`], [`Child`] | Hierarchy of components, enumerated top-down |
//! | Address | [`path_to_address`], [`address_to_path`] | `/`-delimited paths from traversal |
//! | Registry | [`Registry`], [`Parsable`] | Construct a configured variant by name |
//! | Status | [`Status`] | Liveness codes broadcast about components |
//! | Rendering | [`Renderable`], [`RenderedMessage`] | Values that turn themselves into messages |
//!
//! ## Values
//!
//! Remote reads and writes carry [`serde_json::Value`]. Typed parameters
//! convert through `serde`, so a `Parameter<f64>` accepts both `1` and
//! `0.5` from the wire while a `Parameter<i64>` rejects `0.5`.

#![deny(missing_docs)]

pub mod address;
pub mod component;
pub mod error;
pub mod parameter;
pub mod range;
pub mod registry;
pub mod render;
pub mod status;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use address::{Path, address_to_path, is_valid_address, path_to_address, status_address};
pub use component::{Child, Component, Node, SearchFlags};
pub use error::{AddressError, BoxError, ConfigError, ParameterError, ValidationError};
pub use parameter::{AnyParameter, OnChange, Parameter, ParameterBuilder};
pub use range::{NominalRange, NumericRange, ParamRange, ParamType};
pub use registry::{Parsable, Registry};
pub use render::{Renderable, RenderedMessage};
pub use status::Status;
