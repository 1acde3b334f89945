//! CannedRenderable: renders a fixed list of messages.

use crate::render::{Renderable, RenderedMessage};
use serde_json::Value;

/// A [`Renderable`] that always renders the same messages.
#[derive(Debug, Clone, Default)]
pub struct CannedRenderable {
    messages: Vec<RenderedMessage>,
}

impl CannedRenderable {
    /// Render one message per argument list.
    pub fn new(messages: impl IntoIterator<Item = Vec<Value>>) -> Self {
        Self {
            messages: messages.into_iter().map(RenderedMessage::new).collect(),
        }
    }
}

impl Renderable for CannedRenderable {
    fn render(&self) -> Vec<RenderedMessage> {
        self.messages.clone()
    }
}
