//! Values that turn themselves into outgoing messages.

use serde_json::Value;

/// One outgoing message produced by a [`Renderable`]: an ordered argument list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedMessage {
    /// Message arguments.
    pub args: Vec<Value>,
}

impl RenderedMessage {
    /// A message with the given arguments.
    pub fn new(args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            args: args.into_iter().collect(),
        }
    }
}

/// A value that formats itself into one or more messages.
///
/// Each rendered message is sent as its own datagram.
pub trait Renderable: Send + Sync {
    /// Produce the messages to send.
    fn render(&self) -> Vec<RenderedMessage>;
}
