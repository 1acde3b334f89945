//! Name-indexed tables of concrete variants, for construct-by-name setup.
//!
//! Every variant registers itself once at startup with a constructor.
//! Names are case-insensitive. Registering two different concrete types
//! under one name is a [`ConfigError::Collision`]; registering the same
//! type again is a no-op.
//!
//! The base type cannot be inferred from a constructor returning a boxed
//! concrete type, so name it when building the table, with
//! [`Registry::for_base`] or a turbofish on [`Registry::new`].
//!
//! ```
//! use std::sync::OnceLock;
//! use tether_core::{Parsable, Registry};
//!
//! trait Filter {
//!     fn cutoff(&self) -> f64;
//! }
//!
//! #[derive(Default)]
//! struct Lowpass;
//! impl Filter for Lowpass {
//!     fn cutoff(&self) -> f64 { 200.0 }
//! }
//!
//! impl Parsable for dyn Filter {
//!     fn registry() -> &'static Registry<Self> {
//!         static REGISTRY: OnceLock<Registry<dyn Filter>> = OnceLock::new();
//!         REGISTRY.get_or_init(|| {
//!             let mut r = Registry::<dyn Filter>::for_base();
//!             r.register::<Lowpass>("Lowpass", || Box::new(Lowpass)).unwrap();
//!             r
//!         })
//!     }
//! }
//!
//! let f = <dyn Filter>::from_name("LOWPASS").unwrap();
//! assert_eq!(f.cutoff(), 200.0);
//! ```

use std::any::{TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

type Constructor<B> = Arc<dyn Fn() -> Box<B> + Send + Sync>;

/// One registered variant of a base type.
pub struct Variant<B: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    construct: Constructor<B>,
}

impl<B: ?Sized> Variant<B> {
    /// Rust type name of the concrete variant.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Build a fresh instance.
    pub fn construct(&self) -> Box<B> {
        (self.construct)()
    }
}

impl<B: ?Sized> Clone for Variant<B> {
    fn clone(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            construct: Arc::clone(&self.construct),
        }
    }
}

/// Table of variants of `B`, keyed by lower-cased name.
pub struct Registry<B: ?Sized> {
    base: &'static str,
    variants: BTreeMap<String, Variant<B>>,
}

impl<B: ?Sized + 'static> Registry<B> {
    /// An empty registry for base type `B`.
    pub fn new() -> Self {
        Self {
            base: type_name::<B>(),
            variants: BTreeMap::new(),
        }
    }

    /// An empty registry, read as `Registry::<dyn Base>::for_base()`.
    pub fn for_base() -> Self {
        Self::new()
    }

    /// Register the concrete type `V` under `name`.
    ///
    /// `V` is the variant's identity for the collision rule and must be the
    /// type `construct` builds. Registering the same `V` again keeps the
    /// first constructor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Collision`] if a different type already holds `name`.
    pub fn register<V: 'static>(
        &mut self,
        name: &str,
        construct: impl Fn() -> Box<B> + Send + Sync + 'static,
    ) -> Result<&mut Self, ConfigError> {
        let variant = Variant {
            type_id: TypeId::of::<V>(),
            type_name: type_name::<V>(),
            construct: Arc::new(construct),
        };
        self.insert(name.to_lowercase(), variant)?;
        Ok(self)
    }

    fn insert(&mut self, key: String, variant: Variant<B>) -> Result<(), ConfigError> {
        if let Some(existing) = self.variants.get(&key) {
            if existing.type_id != variant.type_id {
                return Err(ConfigError::Collision(key));
            }
            return Ok(());
        }
        tracing::trace!(
            base = self.base,
            name = %key,
            variant = variant.type_name,
            "tether.registry.register"
        );
        self.variants.insert(key, variant);
        Ok(())
    }

    /// Combine another registry into this one, with the same collision rule.
    ///
    /// Nothing is merged if any name collides.
    pub fn merge(&mut self, other: Registry<B>) -> Result<(), ConfigError> {
        for (key, variant) in &other.variants {
            if let Some(existing) = self.variants.get(key)
                && existing.type_id != variant.type_id
            {
                return Err(ConfigError::Collision(key.clone()));
            }
        }
        for (key, variant) in other.variants {
            self.insert(key, variant)?;
        }
        Ok(())
    }

    /// The variant registered under `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownVariant`] if nothing is registered there.
    pub fn lookup(&self, name: &str) -> Result<&Variant<B>, ConfigError> {
        self.variants
            .get(&name.to_lowercase())
            .ok_or_else(|| ConfigError::UnknownVariant {
                name: name.to_owned(),
                base: self.base.to_owned(),
            })
    }

    /// Build the variant registered under `name`.
    pub fn construct(&self, name: &str) -> Result<Box<B>, ConfigError> {
        self.lookup(name).map(Variant::construct)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl<B: ?Sized + 'static> Default for Registry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized> fmt::Debug for Registry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("base", &self.base)
            .field("variants", &self.variants.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A base type whose variants can be built by name from a process-wide registry.
pub trait Parsable: 'static {
    /// The process-wide registry, built once on first use.
    fn registry() -> &'static Registry<Self>;

    /// Build the variant registered under `name`, ignoring case.
    fn from_name(name: &str) -> Result<Box<Self>, ConfigError> {
        Self::registry().construct(name)
    }
}
