//! Named, validated value cells that remote peers can read and write.
//!
//! A [`Parameter`] is a cheap handle: clones share one cell, so the
//! application holds a handle while the tree exposes another. The
//! on-change callback runs after the new value is committed. A failing
//! callback is reported to the caller of `set` and the value stays.
//!
//! ```
//! use tether_core::{NumericRange, Parameter, ParamType};
//!
//! let gain = Parameter::builder("gain", 0.5_f64)
//!     .type_info(ParamType::Float)
//!     .range(NumericRange::new(0.0, 1.0))
//!     .check_range(true)
//!     .build()
//!     .unwrap();
//!
//! assert!(gain.set(2.0).is_err());
//! assert_eq!(gain.get(), 0.5);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BoxError, ConfigError, ParameterError, ValidationError};
use crate::range::{ParamRange, ParamType};

/// Callback invoked with the new value after a successful write.
pub type OnChange<T> = Box<dyn Fn(&T) -> Result<(), BoxError> + Send + Sync>;

struct Inner<T> {
    name: String,
    value: Mutex<T>,
    default: T,
    type_info: Option<ParamType>,
    range: Option<Box<dyn ParamRange<T>>>,
    description: Option<String>,
    on_change: Option<OnChange<T>>,
    check_range: bool,
    check_type: bool,
}

/// A typed parameter handle.
pub struct Parameter<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Parameter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Parameter<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.inner.value.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Parameter")
            .field("name", &self.inner.name)
            .field("value", &*value)
            .field("default", &self.inner.default)
            .field("check_range", &self.inner.check_range)
            .field("check_type", &self.inner.check_type)
            .finish()
    }
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unrenderable>".to_owned())
}

impl<T> Parameter<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// An unchecked parameter holding `default`.
    pub fn new(name: impl Into<String>, default: T) -> Self {
        Self::from_builder(ParameterBuilder::new(name, default))
    }

    /// Start building a parameter with checks, tags, or a callback.
    pub fn builder(name: impl Into<String>, default: T) -> ParameterBuilder<T> {
        ParameterBuilder::new(name, default)
    }

    fn from_builder(b: ParameterBuilder<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: b.name,
                value: Mutex::new(b.default.clone()),
                default: b.default,
                type_info: b.type_info,
                range: b.range,
                description: b.description,
                on_change: b.on_change,
                check_range: b.check_range,
                check_type: b.check_type,
            }),
        }
    }

    /// The parameter's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The value the parameter was created with.
    pub fn default_value(&self) -> &T {
        &self.inner.default
    }

    /// Validate and commit `value`, then run the on-change callback.
    ///
    /// # Errors
    ///
    /// [`ParameterError::Validation`] if an enabled check fails; the prior
    /// value is kept. [`ParameterError::Callback`] if the callback fails;
    /// the new value is kept.
    pub fn set(&self, value: T) -> Result<(), ParameterError> {
        self.validate(&value)?;
        *self
            .inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value.clone();

        if let Some(on_change) = &self.inner.on_change {
            on_change(&value).map_err(|source| ParameterError::Callback {
                parameter: self.inner.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Restore the default value through the validated setter.
    pub fn reset(&self) -> Result<(), ParameterError> {
        self.set(self.inner.default.clone())
    }

    fn validate(&self, value: &T) -> Result<(), ValidationError> {
        if self.inner.check_range
            && let Some(range) = &self.inner.range
            && !range.contains(value)
        {
            return Err(ValidationError::OutOfRange {
                parameter: self.inner.name.clone(),
                value: render(value),
                range: range.tag(),
            });
        }

        if self.inner.check_type
            && let Some(type_info) = &self.inner.type_info
        {
            let wire = serde_json::to_value(value).map_err(|e| ValidationError::Conversion {
                parameter: self.inner.name.clone(),
                value: render(value),
                reason: e.to_string(),
            })?;
            if !type_info.matches(&wire) {
                return Err(ValidationError::TypeMismatch {
                    parameter: self.inner.name.clone(),
                    value: wire.to_string(),
                    expected: type_info.to_string(),
                });
            }
        }
        Ok(())
    }

    fn convert(&self, value: Value) -> Result<T, ValidationError> {
        let conversion_error = |value: &Value, e: serde_json::Error| ValidationError::Conversion {
            parameter: self.inner.name.clone(),
            value: value.to_string(),
            reason: e.to_string(),
        };
        match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => Ok(v),
            // Remote peers often send booleans as 0/1.
            Err(e) => match value.as_i64() {
                Some(n @ (0 | 1)) => serde_json::from_value::<T>(Value::Bool(n == 1))
                    .map_err(|_| conversion_error(&value, e)),
                _ => Err(conversion_error(&value, e)),
            },
        }
    }
}

/// Builder for [`Parameter`]. Checks are validated in [`build`](Self::build).
pub struct ParameterBuilder<T> {
    name: String,
    default: T,
    type_info: Option<ParamType>,
    range: Option<Box<dyn ParamRange<T>>>,
    description: Option<String>,
    on_change: Option<OnChange<T>>,
    check_range: bool,
    check_type: bool,
}

impl<T> ParameterBuilder<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn new(name: impl Into<String>, default: T) -> Self {
        Self {
            name: name.into(),
            default,
            type_info: None,
            range: None,
            description: None,
            on_change: None,
            check_range: false,
            check_type: false,
        }
    }

    /// Declare the wire type.
    pub fn type_info(mut self, type_info: ParamType) -> Self {
        self.type_info = Some(type_info);
        self
    }

    /// Declare the accepted range.
    pub fn range(mut self, range: impl ParamRange<T> + 'static) -> Self {
        self.range = Some(Box::new(range));
        self
    }

    /// Human-readable description sent to remote peers.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Run `f` with every committed value.
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Reject writes outside the declared range.
    pub fn check_range(mut self, enabled: bool) -> Self {
        self.check_range = enabled;
        self
    }

    /// Reject writes that do not match the declared type.
    pub fn check_type(mut self, enabled: bool) -> Self {
        self.check_type = enabled;
        self
    }

    /// Finish the parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if a check is enabled without its predicate, or if
    /// type checking is enabled for a [`ParamType::Custom`] tag.
    pub fn build(self) -> Result<Parameter<T>, ConfigError> {
        if self.check_range && self.range.is_none() {
            return Err(ConfigError::MissingRange(self.name));
        }
        if self.check_type {
            match &self.type_info {
                None => return Err(ConfigError::MissingType(self.name)),
                Some(t) if !t.is_comparable() => {
                    return Err(ConfigError::UncomparableType {
                        parameter: self.name.clone(),
                        tag: t.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Parameter::from_builder(self))
    }
}

/// Object-safe view of a parameter used by the tree and remote commands.
pub trait AnyParameter: Send + Sync {
    /// The parameter's name.
    fn name(&self) -> &str;

    /// The current value as a wire value.
    fn value(&self) -> Value;

    /// Convert a wire value and write it through the validated setter.
    fn set_value(&self, value: Value) -> Result<(), ParameterError>;

    /// `[name, value, default, (type), (range), (description)]`.
    ///
    /// Optional fields are appended only when configured, so a consumer
    /// can only tell which ones are present from the length and order.
    fn describe(&self) -> Vec<Value>;

    /// Address of the shared cell. Equal for all clones of one parameter.
    fn identity(&self) -> *const ();
}

impl<T> AnyParameter for Parameter<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn value(&self) -> Value {
        serde_json::to_value(self.get()).unwrap_or(Value::Null)
    }

    fn set_value(&self, value: Value) -> Result<(), ParameterError> {
        let typed = self.convert(value)?;
        self.set(typed)
    }

    fn describe(&self) -> Vec<Value> {
        let mut info = vec![
            Value::String(self.inner.name.clone()),
            self.value(),
            serde_json::to_value(&self.inner.default).unwrap_or(Value::Null),
        ];
        if let Some(type_info) = &self.inner.type_info {
            info.push(Value::String(type_info.to_string()));
        }
        if let Some(range) = &self.inner.range {
            info.push(Value::String(range.tag()));
        }
        if let Some(description) = &self.inner.description {
            info.push(Value::String(description.clone()));
        }
        info
    }

    fn identity(&self) -> *const () {
        Arc::as_ptr(&self.inner).cast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{NominalRange, NumericRange};
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn unchecked_parameter_accepts_anything() {
        let p = Parameter::builder("gain", 0.5)
            .range(NumericRange::new(0.0, 1.0))
            .build()
            .unwrap();
        p.set(4.0).unwrap();
        assert_eq!(p.get(), 4.0);
    }

    #[test]
    fn checks_require_predicates() {
        let err = Parameter::builder("gain", 0.5).check_range(true).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRange(ref n) if n == "gain"));

        let err = Parameter::builder("gain", 0.5).check_type(true).build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingType(_)));

        let err = Parameter::builder("buf", 0)
            .type_info(ParamType::Custom("buffer~".into()))
            .check_type(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UncomparableType { .. }));
    }

    #[test]
    fn out_of_range_keeps_prior_value() {
        let p = Parameter::builder("voices", 4_i64)
            .range(NumericRange::new(1, 8))
            .check_range(true)
            .build()
            .unwrap();
        let err = p.set(9).unwrap_err();
        assert!(err.to_string().contains("voices"));
        assert!(!err.is_committed());
        assert_eq!(p.get(), 4);
    }

    #[test]
    fn type_check_uses_wire_shape() {
        let p = Parameter::builder("coords", vec![0.0, 0.0])
            .type_info(ParamType::ListSized(2))
            .check_type(true)
            .build()
            .unwrap();
        assert!(p.set(vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            p.set(vec![1.0]),
            Err(ParameterError::Validation(ValidationError::TypeMismatch { .. }))
        ));
        assert_eq!(p.get(), vec![1.0, 2.0]);
    }

    #[test]
    fn callback_sees_committed_value() {
        let seen = Arc::new(AtomicI64::new(0));
        let seen_cb = Arc::clone(&seen);
        let p = Parameter::builder("steps", 1_i64)
            .on_change(move |v| {
                seen_cb.store(*v, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();
        p.set(7).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn callback_error_propagates_without_rollback() {
        let p = Parameter::builder("mode", "a".to_owned())
            .on_change(|_| Err("downstream refused".into()))
            .build()
            .unwrap();
        let err = p.set("b".to_owned()).unwrap_err();
        assert!(err.is_committed());
        assert!(err.to_string().contains("downstream refused"));
        assert_eq!(p.get(), "b");
    }

    #[test]
    fn remote_writes_convert_wire_values() {
        let p = Parameter::new("gain", 0.5_f64);
        p.set_value(json!(1)).unwrap();
        assert_eq!(p.get(), 1.0);

        let count = Parameter::new("count", 3_i64);
        assert!(matches!(
            count.set_value(json!(0.5)),
            Err(ParameterError::Validation(ValidationError::Conversion { .. }))
        ));
        assert_eq!(count.get(), 3);

        let enabled = Parameter::new("enabled", false);
        enabled.set_value(json!(1)).unwrap();
        assert!(enabled.get());
    }

    #[test]
    fn describe_appends_only_configured_fields() {
        let bare = Parameter::new("gain", 0.5);
        assert_eq!(bare.describe(), vec![json!("gain"), json!(0.5), json!(0.5)]);

        let full = Parameter::builder("wave", "sine".to_owned())
            .type_info(ParamType::Str)
            .range(NominalRange::new(["sine".to_owned(), "saw".to_owned()]))
            .description("oscillator shape")
            .build()
            .unwrap();
        full.set("saw".into()).unwrap();
        assert_eq!(
            full.describe(),
            vec![
                json!("wave"),
                json!("saw"),
                json!("sine"),
                json!("str"),
                json!("sine saw"),
                json!("oscillator shape"),
            ]
        );
    }

    #[test]
    fn clones_share_identity() {
        let p = Parameter::new("x", 1_i64);
        let q = p.clone();
        let r = Parameter::new("x", 1_i64);
        assert_eq!(p.identity(), q.identity());
        assert_ne!(p.identity(), r.identity());
        q.set(5).unwrap();
        assert_eq!(p.get(), 5);
    }
}
