//! # Graphics Module
//!
//! Geometry, picking, cameras and the scene for the landmark viewport.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - triangle soups, primitives and OBJ loading
//! - **Picking** ([`picking`]) - rays, bounding boxes and the triangle octree
//! - **Camera System** ([`camera`]) - a perspective/orthographic/PIP rig and its controller
//! - **Scene Management** ([`scene`]) - mesh normalization, landmark symbols, ray casts
//! - **Rendering Output** ([`rendering`]) - per-frame uniforms and instance lists
//!
//! Drawing itself is left to the embedding application: a [`rendering::Frame`]
//! carries everything a GPU backend needs.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod scene;

// Re-export commonly used types
pub use camera::{CameraController, CameraMode, CameraRig};
pub use scene::SceneManager;
