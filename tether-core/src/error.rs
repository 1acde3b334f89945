//! Error types for each category of failure.
//!
//! Configuration and address errors are setup mistakes and always reach
//! the caller. Validation errors come from parameter writes; when the
//! write originated remotely the transport logs them instead.

use thiserror::Error;

/// Boxed error used for callback and command failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid static setup, detected before anything starts listening.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The IP literal could not be parsed.
    #[error("invalid ip address '{0}'")]
    InvalidIp(String),

    /// An address did not follow the `/segment/segment` grammar.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Range checking was enabled without a range predicate.
    #[error("parameter '{0}': no range was declared, checking range is not possible")]
    MissingRange(String),

    /// Type checking was enabled without a type tag.
    #[error("parameter '{0}': no type was declared, checking type is not possible")]
    MissingType(String),

    /// Type checking was enabled with a tag that cannot be compared.
    #[error("parameter '{parameter}': type '{tag}' cannot be compared")]
    UncomparableType {
        /// The parameter being built.
        parameter: String,
        /// The custom type tag.
        tag: String,
    },

    /// Two different variants were registered under one name.
    #[error("found multiple variants with the key '{0}'")]
    Collision(String),

    /// No variant with the given name exists.
    #[error("no variant named '{name}' exists in '{base}'")]
    UnknownVariant {
        /// The requested name.
        name: String,
        /// The base type the registry serves.
        base: String,
    },

    /// A numeric setting was outside its allowed domain.
    #[error("invalid setting {setting}: {reason}")]
    InvalidSetting {
        /// The setting name.
        setting: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Registration and lookup failures on addresses.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AddressError {
    /// A component is already registered at this address.
    #[error("a component ({component}) is already registered for '{address}'")]
    Duplicate {
        /// The contested address.
        address: String,
        /// Name of the component holding it.
        component: String,
    },

    /// Nothing is registered at this address.
    #[error("no component registered for '{0}'")]
    NotRegistered(String),

    /// No parameter or component exists at this path.
    #[error("nothing exists at '{0}'")]
    NotFound(String),
}

/// A parameter write that failed its declared constraints.
///
/// The prior value is always left in place.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The value is outside the declared range.
    #[error("value {value} is out of range ({range}) for parameter '{parameter}'")]
    OutOfRange {
        /// Parameter name.
        parameter: String,
        /// The rejected value, rendered.
        value: String,
        /// The range tag.
        range: String,
    },

    /// The value does not match the declared type.
    #[error("value {value} does not match type '{expected}' for parameter '{parameter}'")]
    TypeMismatch {
        /// Parameter name.
        parameter: String,
        /// The rejected value, rendered.
        value: String,
        /// The type tag.
        expected: String,
    },

    /// A wire value could not be converted into the parameter's type.
    #[error("value {value} cannot be converted for parameter '{parameter}': {reason}")]
    Conversion {
        /// Parameter name.
        parameter: String,
        /// The rejected value, rendered.
        value: String,
        /// Conversion failure message.
        reason: String,
    },
}

/// Errors from writing a parameter, directly or through a tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParameterError {
    /// The write was rejected; nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No parameter exists at the requested path.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The value was committed but the on-change callback failed.
    #[error("on-change callback for '{parameter}' failed: {source}")]
    Callback {
        /// Parameter name.
        parameter: String,
        /// The callback's error.
        #[source]
        source: BoxError,
    },
}

impl ParameterError {
    /// Whether the new value was committed despite the error.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}
