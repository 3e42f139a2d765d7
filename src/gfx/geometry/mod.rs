//! # Geometry
//!
//! Triangle-soup mesh data shared by the scene, the octree and the asset
//! loaders, plus procedural primitives.
//!
//! ## Usage
//!
//! ```rust
//! use landmarker::gfx::geometry::{generate_cube, generate_sphere};
//!
//! let cube = generate_cube();
//! assert_eq!(cube.triangle_count(), 12);
//!
//! let sphere = generate_sphere(32, 16);
//! let bounds = sphere.bounding_sphere();
//! assert!((bounds.radius - 1.0).abs() < 1e-5);
//! ```

pub mod primitives;

pub use primitives::*;

use std::path::Path;

use cgmath::{EuclideanSpace, MetricSpace, Point3};

use crate::error::{Error, Result};
use crate::gfx::picking::Aabb;

/// Represents mesh geometry: indexed triangles over a vertex array
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v); empty when the asset has none
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

/// A sphere enclosing every vertex of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: usize) -> Point3<f64> {
        let [x, y, z] = self.vertices[index];
        Point3::new(x as f64, y as f64, z as f64)
    }

    /// The three corners of triangle `index`.
    pub fn triangle(&self, index: usize) -> [Point3<f64>; 3] {
        let base = index * 3;
        [
            self.vertex(self.indices[base] as usize),
            self.vertex(self.indices[base + 1] as usize),
            self.vertex(self.indices[base + 2] as usize),
        ]
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points((0..self.vertices.len()).map(|i| self.vertex(i)))
    }

    /// Centered on the bounding box, radius reaching the furthest vertex.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let center = self.bounding_box().center();
        let radius = (0..self.vertices.len())
            .map(|i| center.distance(self.vertex(i)))
            .fold(0.0, f64::max);
        BoundingSphere { center, radius }
    }

    /// Load every model in an OBJ file into a single triangle soup.
    ///
    /// Missing normals are computed from the faces.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let (models, _materials) = tobj::load_obj(
            path.as_ref(),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let mut data = GeometryData::new();
        for model in &models {
            let mesh = &model.mesh;
            let offset = data.vertices.len() as u32;

            data.vertices
                .extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
            if mesh.normals.len() == mesh.positions.len() {
                data.normals
                    .extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
            }
            if mesh.texcoords.len() / 2 == mesh.positions.len() / 3 {
                data.tex_coords
                    .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]));
            }
            data.indices.extend(mesh.indices.iter().map(|i| i + offset));
        }

        if data.triangle_count() == 0 {
            return Err(Error::EmptyGeometry);
        }
        if data.normals.len() != data.vertices.len() {
            data.normals = data.compute_vertex_normals();
        }
        if data.tex_coords.len() != data.vertices.len() {
            data.tex_coords.clear();
        }

        log::info!(
            "loaded {} vertices, {} triangles from {}",
            data.vertex_count(),
            data.triangle_count(),
            path.as_ref().display()
        );
        Ok(data)
    }

    /// Area-weighted vertex normals accumulated from the faces.
    pub fn compute_vertex_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![cgmath::Vector3::new(0.0f64, 0.0, 0.0); self.vertices.len()];

        for face in 0..self.triangle_count() {
            let [a, b, c] = self.triangle(face);
            let face_normal = (b - a).cross(c - a);
            for corner in 0..3 {
                normals[self.indices[face * 3 + corner] as usize] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|n| {
                let length = (n.x * n.x + n.y * n.y + n.z * n.z).sqrt();
                if length > 0.0 {
                    [(n.x / length) as f32, (n.y / length) as f32, (n.z / length) as f32]
                } else {
                    [0.0, 0.0, 0.0]
                }
            })
            .collect()
    }

    /// Centroid of all vertices, used when an asset has no natural center.
    pub fn centroid(&self) -> Point3<f64> {
        if self.vertices.is_empty() {
            return Point3::origin();
        }
        let sum = (0..self.vertices.len())
            .map(|i| self.vertex(i).to_vec())
            .fold(cgmath::Vector3::new(0.0, 0.0, 0.0), |acc, v| acc + v);
        Point3::from_vec(sum / self.vertices.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_lookup() {
        let plane = generate_plane(2.0, 2.0, 1, 1);
        assert_eq!(plane.triangle_count(), 2);
        let [a, b, c] = plane.triangle(0);
        assert_eq!(a, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(b, Point3::new(1.0, -1.0, 0.0));
        assert_eq!(c, Point3::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_bounds() {
        let cube = generate_cube();
        let bounds = cube.bounding_box();
        assert_eq!(bounds.min, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.max, Point3::new(0.5, 0.5, 0.5));

        let sphere = cube.bounding_sphere();
        assert_eq!(sphere.center, Point3::new(0.0, 0.0, 0.0));
        assert!((sphere.radius - 0.75f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_normals_of_plane_point_up() {
        let plane = generate_plane(1.0, 1.0, 2, 2);
        for n in plane.compute_vertex_normals() {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        assert!(GeometryData::load_obj("does/not/exist.obj").is_err());
    }
}
