//! # Landmarker Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use landmarker::prelude::*;
//!
//! let viewport = Viewport::new(640.0, 480.0, Settings::default());
//! assert_eq!(viewport.rig().mode(), CameraMode::Perspective);
//! ```

pub use crate::config::{HistorySettings, InteractionSettings, Settings};
pub use crate::error::{Error, Result};
pub use crate::viewport::Viewport;

// Scene and camera
pub use crate::gfx::camera::{CameraController, CameraMode, CameraRig};
pub use crate::gfx::geometry::{generate_cube, generate_plane, generate_sphere, GeometryData};
pub use crate::gfx::rendering::Frame;
pub use crate::gfx::scene::{Asset, AssetKind, SceneManager};

// Input
pub use crate::interaction::{
    ModifiersState, MouseButton, MouseScrollDelta, PointerEvent, TouchPhase, TouchPoint,
    ViewportCallbacks,
};

// Landmark state and persistence
pub use crate::model::{GroupKey, Landmark, LandmarkDocument, LandmarkGroup, LandmarkTracker};
pub use crate::session::{Backend, Notifier, Session, UnsavedChanges};

pub use cgmath::{Point2, Point3};
