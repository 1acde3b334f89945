//! The addressable tree.
//!
//! A [`Component`] enumerates its declared children through
//! [`Component::children`]. Addresses are computed by walking those
//! children top-down on every query; nothing is cached and nodes hold no
//! parent pointer.
//!
//! Traversal rules, applied to children in declaration order:
//!
//! - a component child is recorded at `parent + [name]` and recursed into;
//! - a parameter child is recorded at `parent + [name]`;
//! - a list child is searched only if the node enables list search, and a
//!   mapping child only if it enables key or value search. Entries found
//!   that way follow the two rules above, but containers nested inside
//!   them are not searched.
//!
//! The tree must be acyclic.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::address::{Path, path_to_address};
use crate::error::{AddressError, ParameterError};
use crate::parameter::{AnyParameter, Parameter};

/// Which containers a node searches for children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    /// Search entries of list children.
    pub lists: bool,
    /// Search keys of mapping children.
    pub map_keys: bool,
    /// Search values of mapping children.
    pub map_values: bool,
}

impl SearchFlags {
    /// Search nothing beyond declared components and parameters.
    pub const NONE: Self = Self {
        lists: false,
        map_keys: false,
        map_values: false,
    };

    /// Search lists and both sides of mappings.
    pub const ALL: Self = Self {
        lists: true,
        map_keys: true,
        map_values: true,
    };
}

/// A declared child of a component.
#[derive(Clone)]
pub enum Child {
    /// A nested component.
    Component(Arc<dyn Component>),
    /// A parameter.
    Parameter(Arc<dyn AnyParameter>),
    /// A list held by the component.
    List(Vec<Child>),
    /// A mapping held by the component, as `(key, value)` pairs.
    Map(Vec<(Child, Child)>),
}

impl Child {
    /// Wrap an already type-erased component.
    pub fn component(component: Arc<dyn Component>) -> Self {
        Self::Component(component)
    }

    /// A list child.
    pub fn list(items: impl IntoIterator<Item = Child>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// A mapping child.
    pub fn map(entries: impl IntoIterator<Item = (Child, Child)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    fn name(&self) -> Option<&str> {
        match self {
            Self::Component(c) => Some(c.name()),
            Self::Parameter(p) => Some(p.name()),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl<T> From<Parameter<T>> for Child
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(parameter: Parameter<T>) -> Self {
        Self::Parameter(Arc::new(parameter))
    }
}

impl<T> From<&Parameter<T>> for Child
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(parameter: &Parameter<T>) -> Self {
        Self::Parameter(Arc::new(parameter.clone()))
    }
}

impl<C: Component + 'static> From<Arc<C>> for Child {
    fn from(component: Arc<C>) -> Self {
        Self::Component(component)
    }
}

/// A node in the addressable tree.
pub trait Component: Send + Sync {
    /// The component's name. Need not be unique.
    fn name(&self) -> &str;

    /// Containers this component searches. Defaults to none.
    fn search(&self) -> SearchFlags {
        SearchFlags::NONE
    }

    /// The declared children, in a stable order.
    fn children(&self) -> Vec<Child>;

    /// Every parameter reachable from this component, with its path.
    ///
    /// Paths are relative to this component. If two different parameters
    /// resolve to the same path the first one wins.
    fn list_parameters(&self) -> Vec<(Path, Arc<dyn AnyParameter>)> {
        let mut walk = Walk::default();
        walk.children(self.search(), self.children(), &Vec::new());
        walk.parameters
    }

    /// Every component reachable from this component, with its path.
    fn list_components(&self) -> Vec<(Path, Arc<dyn Component>)> {
        let mut walk = Walk::default();
        walk.children(self.search(), self.children(), &Vec::new());
        walk.components
    }

    /// The parameter at `path`.
    ///
    /// # Errors
    ///
    /// [`AddressError::NotFound`] if nothing is reachable there.
    fn get_parameter(&self, path: &[String]) -> Result<Arc<dyn AnyParameter>, AddressError> {
        self.list_parameters()
            .into_iter()
            .find(|(p, _)| p.as_slice() == path)
            .map(|(_, parameter)| parameter)
            .ok_or_else(|| AddressError::NotFound(path_to_address(path)))
    }

    /// Write `value` to the parameter at `path`.
    ///
    /// # Errors
    ///
    /// [`ParameterError::Address`] if the path is absent, otherwise
    /// whatever the parameter's setter returns.
    fn set_parameter(&self, path: &[String], value: Value) -> Result<(), ParameterError> {
        self.get_parameter(path)?.set_value(value)
    }

    /// The nested component at `path`.
    ///
    /// # Errors
    ///
    /// [`AddressError::NotFound`] if no component is reachable there.
    fn find_component(&self, path: &[String]) -> Result<Arc<dyn Component>, AddressError> {
        self.list_components()
            .into_iter()
            .find(|(p, _)| p.as_slice() == path)
            .map(|(_, component)| component)
            .ok_or_else(|| AddressError::NotFound(path_to_address(path)))
    }
}

#[derive(Default)]
struct Walk {
    parameters: Vec<(Path, Arc<dyn AnyParameter>)>,
    seen: HashMap<Path, *const ()>,
    components: Vec<(Path, Arc<dyn Component>)>,
}

impl Walk {
    fn children(&mut self, flags: SearchFlags, children: Vec<Child>, prefix: &Path) {
        for child in children {
            match child {
                Child::List(items) if flags.lists => {
                    for item in items {
                        self.leaf(item, prefix);
                    }
                }
                Child::Map(entries) if flags.map_keys || flags.map_values => {
                    for (key, value) in entries {
                        if flags.map_keys {
                            self.leaf(key, prefix);
                        }
                        if flags.map_values {
                            self.leaf(value, prefix);
                        }
                    }
                }
                other => self.leaf(other, prefix),
            }
        }
    }

    /// Record a component or parameter; containers stop here.
    fn leaf(&mut self, child: Child, prefix: &Path) {
        let Some(name) = child.name() else {
            return;
        };
        let mut path = prefix.clone();
        path.push(name.to_owned());

        match child {
            Child::Component(component) => {
                self.components.push((path.clone(), Arc::clone(&component)));
                self.children(component.search(), component.children(), &path);
            }
            Child::Parameter(parameter) => self.parameter(path, parameter),
            Child::List(_) | Child::Map(_) => {}
        }
    }

    fn parameter(&mut self, path: Path, parameter: Arc<dyn AnyParameter>) {
        let identity = parameter.identity();
        match self.seen.get(&path) {
            Some(existing) if *existing == identity => {}
            Some(_) => {
                tracing::warn!(
                    address = %path_to_address(&path),
                    "tether.tree.duplicate_address"
                );
            }
            None => {
                self.seen.insert(path.clone(), identity);
                self.parameters.push((path, parameter));
            }
        }
    }
}

/// A general-purpose component whose children can be added and removed.
pub struct Node {
    name: String,
    search: SearchFlags,
    children: RwLock<Vec<Child>>,
}

impl Node {
    /// An empty node that searches nothing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search: SearchFlags::NONE,
            children: RwLock::new(Vec::new()),
        }
    }

    /// Set which containers this node searches.
    pub fn with_search(mut self, search: SearchFlags) -> Self {
        self.search = search;
        self
    }

    /// Append a child.
    pub fn with(self, child: impl Into<Child>) -> Self {
        self.add(child);
        self
    }

    /// Append a child.
    pub fn add(&self, child: impl Into<Child>) {
        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child.into());
    }

    /// Remove every direct component or parameter child called `name`.
    ///
    /// Returns how many children were removed.
    pub fn remove(&self, name: &str) -> usize {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        let before = children.len();
        children.retain(|c| c.name() != Some(name));
        before - children.len()
    }
}

impl Component for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self) -> SearchFlags {
        self.search
    }

    fn children(&self) -> Vec<Child> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
