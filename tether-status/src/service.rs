//! Heartbeat broadcasts and remote parameter commands over one endpoint.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tether_core::{
    AddressError, AnyParameter, Component, Path, Status, path_to_address, status_address,
};
use tether_transport::{
    Arity, DispatchError, Endpoint, Sender, TaskContext, TransportError, string_arg,
};

use crate::directory::StatusDirectory;

/// Registration directory plus the heartbeat that announces it.
///
/// Clones share one directory.
#[derive(Debug, Clone)]
pub struct StatusService {
    directory: Arc<Mutex<StatusDirectory>>,
    sender: Sender,
    interval: Duration,
}

impl StatusService {
    /// A service sending through `sender`, announcing every `interval`.
    pub fn new(sender: Sender, interval: Duration) -> Self {
        Self {
            directory: Arc::default(),
            sender,
            interval,
        }
    }

    /// A service using the endpoint's sender and configured interval.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self::new(endpoint.sender().clone(), endpoint.config().status_interval())
    }

    fn directory(&self) -> MutexGuard<'_, StatusDirectory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The heartbeat interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Bind `component` to `address`, broadcasting on `status_address`.
    ///
    /// # Errors
    ///
    /// [`AddressError::Duplicate`] if `address` is taken and
    /// `override_existing` is false.
    pub fn register(
        &self,
        address: &str,
        status_address: &str,
        component: Arc<dyn Component>,
        override_existing: bool,
    ) -> Result<(), AddressError> {
        let name = component.name().to_owned();
        self.directory()
            .register(address, status_address, component, override_existing)?;
        tracing::info!(address, status_address, component = %name, "tether.status.register");
        Ok(())
    }

    /// [`register`](Self::register) with the conventional `<address>/status`
    /// status address and no override.
    pub fn register_default(
        &self,
        address: &str,
        component: Arc<dyn Component>,
    ) -> Result<(), AddressError> {
        self.register(address, &status_address(address), component, false)
    }

    /// Remove the binding at `address` and send one TERMINATED for it.
    ///
    /// # Errors
    ///
    /// [`AddressError::NotRegistered`] if nothing is bound there.
    pub fn deregister(&self, address: &str) -> Result<(), AddressError> {
        let entry = self.directory().deregister(address)?;
        tracing::info!(address, "tether.status.deregister");
        self.sender
            .send_status(&entry.status_address, Status::Terminated);
        Ok(())
    }

    /// Registered addresses, sorted.
    pub fn addresses(&self) -> Vec<String> {
        self.directory().addresses()
    }

    /// Status addresses of every registration.
    pub fn status_addresses(&self) -> Vec<String> {
        self.directory().status_addresses()
    }

    /// Send `status` to every registered status address.
    pub fn broadcast(&self, status: Status) {
        let targets = self.status_addresses();
        tracing::debug!(%status, targets = targets.len(), "tether.status.broadcast");
        for target in &targets {
            self.sender.send_status(target, status);
        }
    }

    /// Announce READY every interval until the endpoint stops, then
    /// announce TERMINATED once.
    pub async fn heartbeat(self, ctx: TaskContext) {
        while ctx.is_running() {
            self.broadcast(Status::Ready);
            if !ctx.sleep(self.interval).await {
                break;
            }
        }
        self.broadcast(Status::Terminated);
    }

    /// Schedule the heartbeat on `endpoint` and install the remote
    /// `set`, `get`, `list` and `components` commands.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidState`] if the endpoint has already started.
    pub fn attach(&self, endpoint: &Endpoint) -> Result<(), TransportError> {
        let heartbeat = self.clone();
        endpoint.add_task(move |ctx| heartbeat.heartbeat(ctx))?;

        let service = self.clone();
        endpoint.register_command("set", Arity::AtLeast(2), move |args| service.remote_set(args));
        let service = self.clone();
        endpoint.register_command("get", Arity::Exact(1), move |args| service.remote_get(args));
        let service = self.clone();
        endpoint.register_command("list", Arity::Exact(1), move |args| service.remote_list(args));
        let service = self.clone();
        endpoint.register_command("components", Arity::Exact(0), move |_| {
            service.remote_components();
            Ok(())
        });
        Ok(())
    }

    /// The registered component covering `address` and the path below it.
    ///
    /// The directory lock is released before the component is used, so
    /// on-change callbacks may register or deregister.
    fn resolve(&self, address: &str) -> Result<(Arc<dyn Component>, Path), AddressError> {
        self.directory()
            .resolve(address)
            .map(|(_, entry, path)| (Arc::clone(&entry.component), path))
            .ok_or_else(|| AddressError::NotRegistered(address.to_owned()))
    }

    fn parameter(&self, address: &str) -> Result<Arc<dyn AnyParameter>, AddressError> {
        let (component, path) = self.resolve(address)?;
        component.get_parameter(&path)
    }

    fn remote_set(&self, args: &[Value]) -> Result<(), DispatchError> {
        let address = string_arg("set", args, 0)?;
        let value = match &args[1..] {
            [single] => single.clone(),
            many => Value::Array(many.to_vec()),
        };
        let (component, path) = self.resolve(address)?;
        component.set_parameter(&path, value)?;
        tracing::debug!(address, "tether.status.remote_set");
        Ok(())
    }

    fn remote_get(&self, args: &[Value]) -> Result<(), DispatchError> {
        let address = string_arg("get", args, 0)?;
        let parameter = self.parameter(address)?;
        self.sender.send(&parameter.describe(), Some(address));
        Ok(())
    }

    fn remote_list(&self, args: &[Value]) -> Result<(), DispatchError> {
        let address = string_arg("list", args, 0)?;
        let (component, path) = self.resolve(address)?;
        let target = if path.is_empty() {
            component
        } else {
            component.find_component(&path)?
        };
        let base = address.trim_end_matches('/');
        for (path, parameter) in target.list_parameters() {
            let full = format!("{base}{}", path_to_address(&path));
            self.sender.send(&parameter.describe(), Some(&full));
        }
        Ok(())
    }

    fn remote_components(&self) {
        let addresses: Vec<Value> = self.addresses().into_iter().map(Value::String).collect();
        self.sender.send(&addresses, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr};
    use tether_core::Node;

    fn service() -> StatusService {
        let nowhere = SocketAddr::from((Ipv4Addr::LOCALHOST, 9));
        StatusService::new(Sender::bind(nowhere, "/test").unwrap(), Duration::from_millis(10))
    }

    #[test]
    fn clones_share_the_directory() {
        let a = service();
        let b = a.clone();
        a.register_default("/mixer", Arc::new(Node::new("mixer"))).unwrap();
        assert_eq!(b.addresses(), vec!["/mixer"]);
        assert_eq!(b.status_addresses(), vec!["/mixer/status"]);

        b.deregister("/mixer").unwrap();
        assert!(a.addresses().is_empty());
        assert!(matches!(a.deregister("/mixer"), Err(AddressError::NotRegistered(_))));
    }

    #[test]
    fn unregistered_address_is_an_address_error() {
        let service = service();
        let err = service.remote_set(&[Value::from("/ghost/gain"), Value::from(1)]).unwrap_err();
        assert!(matches!(err, DispatchError::Address(AddressError::NotRegistered(_))));
    }
}
