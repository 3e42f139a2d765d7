use std::path::Path;

use cgmath::Vector3;

use crate::error::Result;
use crate::gfx::geometry::{generate_image_plane, GeometryData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Mesh,
    /// A flat image, annotated with 2D landmarks in pixel coordinates
    Image { width: u32, height: u32 },
}

/// Something to annotate: geometry plus the directions that should face up
/// and towards the viewer once it is placed in the scene.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub geometry: GeometryData,
    pub up: Vector3<f64>,
    pub front: Vector3<f64>,
}

impl Asset {
    pub fn mesh(id: impl Into<String>, geometry: GeometryData) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Mesh,
            geometry,
            up: Vector3::unit_y(),
            front: Vector3::unit_z(),
        }
    }

    pub fn load_obj(id: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::mesh(id, GeometryData::load_obj(path)?))
    }

    /// An image spanning `0..width` by `0..height` with pixel row 0 at the
    /// top of the screen. The plane is seen from behind so the image is not
    /// mirrored.
    pub fn image(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Image { width, height },
            geometry: generate_image_plane(width, height),
            up: -Vector3::unit_y(),
            front: -Vector3::unit_z(),
        }
    }

    pub fn with_orientation(mut self, up: Vector3<f64>, front: Vector3<f64>) -> Self {
        self.up = up;
        self.front = front;
        self
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, AssetKind::Image { .. })
    }

    /// Landmark dimensionality for this asset.
    pub fn dims(&self) -> usize {
        if self.is_image() {
            2
        } else {
            3
        }
    }
}
