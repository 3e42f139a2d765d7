//! # Settings
//!
//! Tunable constants for the camera rig, gesture handlers, history and scene.
//! Every field has a default, so a partial JSON document only overrides what
//! it names:
//!
//! ```rust
//! use landmarker::config::Settings;
//!
//! let settings = Settings::from_json_str(r#"{ "history": { "max_operations": 10 } }"#).unwrap();
//! assert_eq!(settings.history.max_operations, 10);
//! assert_eq!(settings.history.max_states, 25);
//! ```

use serde::Deserialize;

use crate::error::Result;

/// Top level settings for a viewport and its landmark session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraSettings,
    pub interaction: InteractionSettings,
    pub history: HistorySettings,
    pub scene: SceneSettings,
}

impl Settings {
    /// Parse settings from JSON, filling omitted fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Camera rig behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Radians of rotation per unit of normalized screen motion.
    pub rotate_speed: f64,
    /// Perspective dolly per wheel unit, relative to the distance to target.
    pub zoom_speed: f64,
    /// Perspective pan per pixel, relative to the distance to target.
    pub pan_speed: f64,
    /// Orthographic frustum contraction per wheel unit.
    pub ortho_zoom_speed: f64,
    /// Fraction of rotation lost per inertia frame.
    pub damping_factor: f64,
    /// Smallest width/height the orthographic frustum may collapse to.
    pub min_frustum_extent: f64,
    /// Magnification of the picture-in-picture view.
    pub pip_zoom_factor: f64,
    /// PIP viewport size as a fraction of the viewport height.
    pub pip_size: f64,
    /// Inertial rotation stops below this angle.
    pub inertia_epsilon: f64,
    /// The perspective camera never dollies closer than this to its target.
    pub min_distance: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 0.001,
            pan_speed: 0.001,
            ortho_zoom_speed: 0.0007,
            damping_factor: 0.2,
            min_frustum_extent: 0.0001,
            pip_zoom_factor: 12.0,
            pip_size: 0.25,
            inertia_epsilon: 1e-4,
            min_distance: 0.01,
        }
    }
}

/// Gesture disambiguation thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Pointer travel (pixels) under which a press/release counts as a click.
    pub click_tolerance: f64,
    /// How many nearby landmarks the snap handler tracks.
    pub snap_candidates: usize,
    /// Stylus input is ignored for this long after a pinch ends.
    pub stylus_pinch_debounce_ms: u64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            click_tolerance: 2.0,
            snap_candidates: 4,
            stylus_pinch_debounce_ms: 200,
        }
    }
}

/// Bounds on the undo/redo logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_operations: usize,
    pub max_states: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_operations: 100,
            max_states: 25,
        }
    }
}

/// Scene construction parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// A leaf splits into octants once it holds more items than this.
    pub octree_leaf_capacity: usize,
    /// Leaves at this depth never split, however full.
    pub octree_max_depth: usize,
    /// Landmark symbol radius as a fraction of the mesh bounding radius.
    pub landmark_scale: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            octree_leaf_capacity: 75,
            octree_max_depth: 10,
            landmark_scale: 0.01,
        }
    }
}
