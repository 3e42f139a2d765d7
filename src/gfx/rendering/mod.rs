//! Renderer-facing output: the per-frame camera uniforms, instance lists and
//! overlay that a GPU backend draws.

pub mod frame;
pub mod instance;

pub use frame::{Frame, Overlay, PipFrame};
pub use instance::{LandmarkInstance, LineInstance};
