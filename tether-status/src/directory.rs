//! Address directory: which component answers at which external address.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tether_core::{AddressError, Component, Path, address_to_path};

/// One directory entry.
#[derive(Clone)]
pub struct Registration {
    /// The registered component.
    pub component: Arc<dyn Component>,
    /// Where its liveness is broadcast.
    pub status_address: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("component", &self.component.name())
            .field("status_address", &self.status_address)
            .finish()
    }
}

/// Map of external address to registered component, ordered by address.
#[derive(Debug, Default)]
pub struct StatusDirectory {
    entries: BTreeMap<String, Registration>,
}

impl StatusDirectory {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `component` to `address`.
    ///
    /// # Errors
    ///
    /// [`AddressError::Duplicate`] if `address` is taken and
    /// `override_existing` is false. The existing binding is kept.
    pub fn register(
        &mut self,
        address: impl Into<String>,
        status_address: impl Into<String>,
        component: Arc<dyn Component>,
        override_existing: bool,
    ) -> Result<(), AddressError> {
        let address = address.into();
        if !override_existing && let Some(existing) = self.entries.get(&address) {
            return Err(AddressError::Duplicate {
                address,
                component: existing.component.name().to_owned(),
            });
        }
        self.entries.insert(
            address,
            Registration {
                component,
                status_address: status_address.into(),
            },
        );
        Ok(())
    }

    /// Remove the binding at `address` and return it.
    ///
    /// # Errors
    ///
    /// [`AddressError::NotRegistered`] if nothing is bound there.
    pub fn deregister(&mut self, address: &str) -> Result<Registration, AddressError> {
        self.entries
            .remove(address)
            .ok_or_else(|| AddressError::NotRegistered(address.to_owned()))
    }

    /// The binding at `address`.
    pub fn get(&self, address: &str) -> Option<&Registration> {
        self.entries.get(address)
    }

    /// Whether `address` is bound.
    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    /// Registered addresses, sorted.
    pub fn addresses(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Status addresses, in the same order as [`addresses`](Self::addresses).
    pub fn status_addresses(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|entry| entry.status_address.clone())
            .collect()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the registration whose address is the longest prefix of
    /// `address`, on a segment boundary.
    ///
    /// Returns the registered address, its component and the remaining
    /// path below it (empty for an exact match).
    pub fn resolve(&self, address: &str) -> Option<(&str, &Registration, Path)> {
        self.entries
            .iter()
            .filter_map(|(registered, entry)| {
                let rest = below(registered, address)?;
                Some((registered.as_str(), entry, rest))
            })
            .max_by_key(|(registered, _, _)| registered.len())
            .map(|(registered, entry, rest)| {
                let path = if rest.is_empty() {
                    Vec::new()
                } else {
                    address_to_path(rest)
                };
                (registered, entry, path)
            })
    }
}

/// The part of `address` below `prefix`, or `None` if `prefix` does not
/// cover it.
fn below<'a>(prefix: &str, address: &'a str) -> Option<&'a str> {
    let base = prefix.strip_suffix('/').unwrap_or(prefix);
    let rest = address.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.strip_prefix('/').unwrap_or(rest))
    } else {
        None
    }
}
