//! Fire-and-forget outbound messages.
//!
//! Every send is one datagram to the fixed destination. There is no
//! retry and no acknowledgement; failures are logged and dropped.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use serde_json::Value;
use tether_core::{Renderable, Status};

use crate::codec;

/// Handle for sending messages. Clones share one socket.
#[derive(Debug, Clone)]
pub struct Sender {
    socket: Arc<UdpSocket>,
    destination: SocketAddr,
    default_address: Arc<str>,
}

impl Sender {
    /// Open a non-blocking socket on an ephemeral port that sends to `destination`.
    pub fn bind(destination: SocketAddr, default_address: &str) -> io::Result<Self> {
        let local: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket: Arc::new(socket),
            destination,
            default_address: Arc::from(default_address),
        })
    }

    /// Where messages go.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// The address used when none is given.
    pub fn default_address(&self) -> &str {
        &self.default_address
    }

    /// Send `args` to `address`, or to the default address.
    ///
    /// Nested lists are flattened into the argument list.
    pub fn send(&self, args: &[Value], address: Option<&str>) {
        let address = address.unwrap_or(self.default_address.as_ref());
        self.send_datagram(address, args);
    }

    /// Render `renderable` and send each resulting message as its own datagram.
    pub fn send_renderable(&self, renderable: &dyn Renderable, address: Option<&str>) {
        let address = address.unwrap_or(self.default_address.as_ref());
        for message in renderable.render() {
            self.send_datagram(address, &message.args);
        }
    }

    /// Send a single status code to `address`.
    pub fn send_status(&self, address: &str, status: Status) {
        tracing::trace!(address, %status, "tether.sender.status");
        self.send_datagram(address, &[Value::from(status.code())]);
    }

    fn send_datagram(&self, address: &str, args: &[Value]) {
        let bytes = match codec::encode(address, args) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(address, error = %e, "tether.sender.encode_failed");
                return;
            }
        };
        if let Err(e) = self.socket.send_to(&bytes, self.destination) {
            tracing::warn!(
                address,
                destination = %self.destination,
                error = %e,
                "tether.sender.send_failed"
            );
        }
    }
}
