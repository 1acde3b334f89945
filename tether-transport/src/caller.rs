//! Decode-and-invoke: named commands with declared arity.
//!
//! A message sent to the endpoint's prefix names an operation either in
//! its first argument (`/engine "set" "/a/gain" 0.5`) or in the last
//! address segment (`/engine/set "/a/gain" 0.5`). The [`Caller`] looks the
//! operation up, checks the argument count, and runs the command.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::DispatchError;

/// How many arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many.
    Exact(usize),
    /// This many or more.
    AtLeast(usize),
    /// Any number.
    Any,
}

impl Arity {
    /// Whether `n` arguments are acceptable.
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exact(expected) => n == expected,
            Self::AtLeast(min) => n >= min,
            Self::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Any => f.write_str("any number of"),
        }
    }
}

type CommandFn = Box<dyn FnMut(&[Value]) -> Result<(), DispatchError> + Send>;

struct Command {
    arity: Arity,
    run: CommandFn,
}

/// Table of named commands invoked by inbound messages.
#[derive(Default)]
pub struct Caller {
    commands: BTreeMap<String, Command>,
}

impl Caller {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous command.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: Arity, f: F) -> &mut Self
    where
        F: FnMut(&[Value]) -> Result<(), DispatchError> + Send + 'static,
    {
        let name = name.into();
        if self.commands.contains_key(&name) {
            tracing::debug!(operation = %name, "tether.caller.replace");
        }
        self.commands.insert(
            name,
            Command {
                arity,
                run: Box::new(f),
            },
        );
        self
    }

    /// Whether a command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Run the command `operation` with `args`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownOperation`], [`DispatchError::ArgumentCount`],
    /// or whatever the command returns.
    pub fn call(&mut self, operation: &str, args: &[Value]) -> Result<(), DispatchError> {
        let command = self
            .commands
            .get_mut(operation)
            .ok_or_else(|| DispatchError::UnknownOperation(operation.to_owned()))?;
        if !command.arity.accepts(args.len()) {
            return Err(DispatchError::ArgumentCount {
                operation: operation.to_owned(),
                expected: command.arity,
                got: args.len(),
            });
        }
        tracing::debug!(operation, args = args.len(), "tether.caller.call");
        (command.run)(args)
    }

    /// Decode the operation name and call it.
    ///
    /// `child` is the address segment below the endpoint prefix, if any.
    /// Without one, the first argument must be a string naming the operation.
    pub fn invoke(&mut self, child: Option<&str>, args: &[Value]) -> Result<(), DispatchError> {
        match child {
            Some(operation) => self.call(operation, args),
            None => match args.split_first() {
                Some((Value::String(operation), rest)) => self.call(operation, rest),
                _ => Err(DispatchError::MissingOperation),
            },
        }
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller")
            .field("operations", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read argument `index` as a string, for command implementations.
pub fn string_arg<'a>(
    operation: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, DispatchError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidArgument {
            operation: operation.to_owned(),
            reason: format!("argument {index} must be a string"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn recording() -> (Caller, Arc<Mutex<Vec<Vec<Value>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let mut caller = Caller::new();
        caller.register("gain", Arity::Exact(1), move |args| {
            sink.lock().unwrap().push(args.to_vec());
            Ok(())
        });
        (caller, calls)
    }

    #[test]
    fn operation_from_first_argument() {
        let (mut caller, calls) = recording();
        caller.invoke(None, &[json!("gain"), json!(0.5)]).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![vec![json!(0.5)]]);
    }

    #[test]
    fn operation_from_child_segment() {
        let (mut caller, calls) = recording();
        caller.invoke(Some("gain"), &[json!(0.25)]).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![vec![json!(0.25)]]);
    }

    #[test]
    fn unknown_operation_and_bad_arity() {
        let (mut caller, calls) = recording();
        assert!(matches!(
            caller.invoke(None, &[json!("pan"), json!(1)]),
            Err(DispatchError::UnknownOperation(ref op)) if op == "pan"
        ));
        let err = caller.invoke(None, &[json!("gain")]).unwrap_err();
        assert_eq!(err.to_string(), "operation 'gain' expects 1 argument(s), got 0");
        assert!(matches!(caller.invoke(None, &[]), Err(DispatchError::MissingOperation)));
        assert!(matches!(caller.invoke(None, &[json!(3)]), Err(DispatchError::MissingOperation)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn arity_rules() {
        assert!(Arity::AtLeast(2).accepts(5));
        assert!(!Arity::AtLeast(2).accepts(1));
        assert!(Arity::Any.accepts(0));
    }
}
