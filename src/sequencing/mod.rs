pub mod demo;
pub mod notes;

pub use demo::{DemoAction, DemoSequencer, DemoStep};
