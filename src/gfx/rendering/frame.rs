use cgmath::Point2;

use super::instance::{LandmarkInstance, LineInstance};
use crate::gfx::camera::{CameraMode, CameraUniform};

/// 2D decorations drawn over the viewport, in pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Opposite corners of the shift-drag selection rectangle
    pub selection_box: Option<[Point2<f64>; 2]>,
    /// Snap targeting guide lines from the cursor to candidate landmarks
    pub guides: Vec<[Point2<f64>; 2]>,
}

impl Overlay {
    pub fn clear(&mut self) {
        self.selection_box = None;
        self.guides.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selection_box.is_none() && self.guides.is_empty()
    }
}

/// The zoomed inset drawn in orthographic mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipFrame {
    pub camera: CameraUniform,
    /// `[x, y, width, height]` in pixels
    pub viewport: [f32; 4],
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sequence number, counting from 1
    pub number: u64,
    pub mode: CameraMode,
    pub camera: CameraUniform,
    pub pip: Option<PipFrame>,
    /// Mesh-local to world transform
    pub model: [[f32; 4]; 4],
    pub landmarks: Vec<LandmarkInstance>,
    pub lines: Vec<LineInstance>,
    pub overlay: Overlay,
}
