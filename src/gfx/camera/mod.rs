pub mod camera_controller;
pub mod camera_rig;
pub mod camera_utils;
pub mod cameras;

// Re-export main types
pub use camera_controller::{CameraController, CameraState};
pub use camera_rig::{CameraMode, CameraRig, PipView};
pub use camera_utils::{Camera, CameraUniform};
pub use cameras::{OrthographicCamera, PerspectiveCamera, Pose};
