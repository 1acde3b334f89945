//! Fixtures for testing.
//!
//! Available behind the `test-utils` feature flag.

mod canned_renderable;
mod synth_tree;

pub use canned_renderable::CannedRenderable;
pub use synth_tree::SynthTree;
