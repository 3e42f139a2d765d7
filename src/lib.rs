// src/lib.rs
//! Landmarker
//!
//! Viewport interaction and landmark state for annotating 3D meshes and 2D
//! images. The crate owns the camera rig, octree ray picking, the mouse and
//! touch gesture state machines and the undo/redo history; drawing is left to
//! the embedding application, which receives a [`gfx::rendering::Frame`] per
//! render.
//!
//! - [`viewport::Viewport`] - forwards input and produces frames
//! - [`model::LandmarkGroup`] - landmarks, connectivity, labels and history
//! - [`session::Session`] - loads and saves groups through a [`session::Backend`]

pub mod config;
pub mod error;
pub mod gfx;
pub mod interaction;
pub mod model;
pub mod prelude;
pub mod session;
pub mod viewport;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use viewport::Viewport;
