//! The control endpoint: listener, sender and cooperative scheduler.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tether_core::Renderable;
use tether_core::address::match_prefix;
use tokio::net::UdpSocket;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::caller::{Arity, Caller};
use crate::codec;
use crate::config::EndpointConfig;
use crate::error::{DispatchError, TransportError};
use crate::sender::Sender;

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type TaskFn = Box<dyn FnOnce(TaskContext) -> TaskFuture + Send>;

/// Lifecycle of an endpoint. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Constructed, not yet listening. Tasks may be added.
    Created,
    /// Listening and running tasks.
    Running,
    /// Finished. Terminal.
    Stopped,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Running => f.write_str("running"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// What every scheduled task receives: the running flag and a sender.
#[derive(Debug, Clone)]
pub struct TaskContext {
    token: CancellationToken,
    sender: Sender,
}

impl TaskContext {
    /// Whether the endpoint is still running. Loops should check this.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Ask the endpoint to stop.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Resolves once the endpoint has been asked to stop.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Sleep for `duration`, waking early if the endpoint stops.
    ///
    /// Returns `true` if the full duration elapsed while still running.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => self.is_running(),
        }
    }

    /// The endpoint's sender.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }
}

/// A primary task for endpoints with no processing of their own.
pub async fn run_until_stopped(ctx: TaskContext) {
    ctx.stopped().await;
}

struct Lifecycle {
    state: EndpointState,
    tasks: Vec<TaskFn>,
}

/// One control endpoint per process.
pub struct Endpoint {
    config: EndpointConfig,
    recv_addr: SocketAddr,
    sender: Sender,
    token: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
    caller: Mutex<Caller>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("recv_addr", &self.recv_addr)
            .field("destination", &self.sender.destination())
            .field("default_address", &self.config.default_address)
            .field("state", &self.state())
            .finish()
    }
}

impl Endpoint {
    /// Validate `config` and open the sender. Does not listen yet.
    ///
    /// # Errors
    ///
    /// [`TransportError::Config`] for invalid configuration,
    /// [`TransportError::Sender`] if the outbound socket cannot be opened.
    pub fn new(config: EndpointConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let recv_addr = config.recv_addr()?;
        let sender = Sender::bind(config.destination()?, &config.default_address)
            .map_err(TransportError::Sender)?;
        Ok(Self {
            config,
            recv_addr,
            sender,
            token: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle {
                state: EndpointState::Created,
                tasks: Vec::new(),
            }),
            caller: Mutex::new(Caller::new()),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Where the listener binds.
    pub fn recv_addr(&self) -> SocketAddr {
        self.recv_addr
    }

    /// The outbound sender.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// The current lifecycle state.
    pub fn state(&self) -> EndpointState {
        self.lifecycle().state
    }

    /// Whether the endpoint is listening and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.state() == EndpointState::Running && !self.token.is_cancelled()
    }

    /// A context sharing this endpoint's running flag and sender.
    pub fn context(&self) -> TaskContext {
        TaskContext {
            token: self.token.clone(),
            sender: self.sender.clone(),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn caller(&self) -> MutexGuard<'_, Caller> {
        self.caller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an auxiliary task to run alongside the primary task.
    ///
    /// The task set is fixed at start.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidState`] once the endpoint has started.
    pub fn add_task<F, Fut>(&self, task: F) -> Result<(), TransportError>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != EndpointState::Created {
            return Err(TransportError::InvalidState {
                expected: EndpointState::Created,
                actual: lifecycle.state,
            });
        }
        lifecycle
            .tasks
            .push(Box::new(move |ctx| Box::pin(task(ctx)) as TaskFuture));
        Ok(())
    }

    /// Register a command invoked by inbound messages.
    pub fn register_command<F>(&self, name: impl Into<String>, arity: Arity, f: F)
    where
        F: FnMut(&[Value]) -> Result<(), DispatchError> + Send + 'static,
    {
        self.caller().register(name, arity, f);
    }

    /// Send `args` to `address`, or to the default address.
    pub fn send(&self, args: &[Value], address: Option<&str>) {
        self.sender.send(args, address);
    }

    /// Render `renderable` and send each message as its own datagram.
    pub fn send_renderable(&self, renderable: &dyn Renderable, address: Option<&str>) {
        self.sender.send_renderable(renderable, address);
    }

    /// Ask every task to stop. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            tracing::info!(address = %self.recv_addr, "tether.endpoint.stop");
        }
        self.token.cancel();
    }

    /// Listen and run `primary` plus every auxiliary task until all return.
    ///
    /// Everything runs joined on the calling task. Returns once the
    /// endpoint has stopped and every task has exited. If every task
    /// returns on its own the endpoint stops as well.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidState`] if the endpoint was already started.
    /// - [`TransportError::Bind`] if the listener cannot bind; the endpoint stops.
    /// - [`TransportError::Interrupted`] if Ctrl-C stopped the endpoint. See
    ///   [`EndpointConfig::handle_interrupt`] for the lasting effect on SIGINT.
    /// - [`TransportError::Dispatch`] if a dispatch fault stopped a strict endpoint.
    pub async fn start<F, Fut>(&self, primary: F) -> Result<(), TransportError>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = ()>,
    {
        let tasks = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != EndpointState::Created {
                return Err(TransportError::InvalidState {
                    expected: EndpointState::Created,
                    actual: lifecycle.state,
                });
            }
            lifecycle.state = EndpointState::Running;
            std::mem::take(&mut lifecycle.tasks)
        };

        let socket = match UdpSocket::bind(self.recv_addr).await {
            Ok(socket) => socket,
            Err(source) => {
                tracing::error!(
                    critical = true,
                    address = %self.recv_addr,
                    error = %source,
                    "tether.endpoint.bind_failed"
                );
                self.stop();
                self.lifecycle().state = EndpointState::Stopped;
                return Err(TransportError::Bind {
                    address: self.recv_addr,
                    source,
                });
            }
        };

        tracing::info!(
            address = %self.recv_addr,
            destination = %self.sender.destination(),
            prefix = %self.config.default_address,
            tasks = tasks.len(),
            "tether.endpoint.start"
        );

        let auxiliary =
            futures::future::join_all(tasks.into_iter().map(|task| task(self.context())));
        // Once every task has exited there is nothing left to serve.
        let scheduled = async {
            tokio::join!(primary(self.context()), auxiliary);
            self.stop();
        };
        let ((), received, interrupted) =
            tokio::join!(scheduled, self.receive(socket), self.watch_interrupt());

        self.lifecycle().state = EndpointState::Stopped;
        tracing::info!(address = %self.recv_addr, "tether.endpoint.stopped");

        received?;
        if interrupted {
            return Err(TransportError::Interrupted);
        }
        Ok(())
    }

    /// Build a current-thread runtime and [`start`](Self::start) on it.
    ///
    /// This is the single logical thread of control for the endpoint.
    pub fn run<F, Fut>(&self, primary: F) -> Result<(), TransportError>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = ()>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;
        runtime.block_on(self.start(primary))
    }

    /// Receive until stopped. The socket is dropped, closing the listener,
    /// when this returns.
    async fn receive(&self, socket: UdpSocket) -> Result<(), TransportError> {
        let mut buf = vec![0_u8; self.config.recv_buffer];
        loop {
            let (len, peer) = tokio::select! {
                _ = self.token.cancelled() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        tracing::warn!(error = %e, "tether.endpoint.recv_failed");
                        continue;
                    }
                },
            };

            if let Err(e) = self.dispatch(&buf[..len]) {
                tracing::error!(peer = %peer, error = %e, "tether.dispatch.failed");
                tracing::debug!(peer = %peer, error = ?e, "tether.dispatch.failed_detail");
                if self.config.strict {
                    self.stop();
                    return Err(e.into());
                }
            }
        }
        tracing::debug!(address = %self.recv_addr, "tether.endpoint.listener_closed");
        Ok(())
    }

    /// Decode one datagram and hand it to the caller if its address matches.
    fn dispatch(&self, bytes: &[u8]) -> Result<(), DispatchError> {
        let datagram = codec::decode(bytes)?;
        match match_prefix(&self.config.default_address, &datagram.address) {
            Some(child) => self.caller().invoke(child, &datagram.args),
            None => {
                tracing::info!(address = %datagram.address, "tether.dispatch.unmatched");
                Ok(())
            }
        }
    }

    /// Stop on Ctrl-C. Returns whether the interrupt fired.
    ///
    /// Nothing is installed when `handle_interrupt` is off. Otherwise the
    /// process keeps tokio's SIGINT handler after the endpoint stops.
    async fn watch_interrupt(&self) -> bool {
        if !self.config.handle_interrupt {
            return false;
        }
        tokio::select! {
            _ = self.token.cancelled() => false,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    tracing::error!(critical = true, "tether.endpoint.interrupted");
                    self.stop();
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "tether.endpoint.signal_unavailable");
                    false
                }
            },
        }
    }
}
