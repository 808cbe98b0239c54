//! Graph nodes wrap the DSP primitives with note events and block rendering.

/// Core traits shared by all graph nodes.
pub mod node;
/// The echo voice patch.
pub mod tone;

pub use node::{GraphNode, RenderCtx};
pub use tone::ToneNode;
