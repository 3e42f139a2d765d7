use cgmath::{EuclideanSpace, InnerSpace, Matrix, Matrix3, Matrix4, Point3, SquareMatrix, Vector3};

use super::vertex::Vertex3D;
use crate::gfx::geometry::{BoundingSphere, GeometryData};
use crate::gfx::picking::{Aabb, Octree};

/// A single transform node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix: Matrix4<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }
}

impl Transform {
    /// Set translation
    pub fn set_translation(&mut self, translation: Vector3<f64>) {
        self.matrix = Matrix4::from_translation(translation);
    }

    /// Uniform scale after a rotation taking `up` to +Y and `front` to +Z.
    pub fn set_scale_rotation(&mut self, scale: f64, up: Vector3<f64>, front: Vector3<f64>) {
        self.matrix = Matrix4::from_scale(scale) * Matrix4::from(orientation(up, front));
    }

    /// Reset to identity matrix
    pub fn reset(&mut self) {
        self.matrix = Matrix4::identity();
    }
}

/// Rotation mapping `front` onto +Z and the part of `up` orthogonal to it
/// onto +Y.
pub fn orientation(up: Vector3<f64>, front: Vector3<f64>) -> Matrix3<f64> {
    let front = if front.magnitude2() > 0.0 {
        front.normalize()
    } else {
        Vector3::unit_z()
    };
    let mut up = up - front * up.dot(front);
    if up.magnitude2() < 1e-12 {
        up = if front.y.abs() < 0.9 {
            Vector3::unit_y()
        } else {
            Vector3::unit_x()
        };
        up = up - front * up.dot(front);
    }
    let up = up.normalize();
    let right = up.cross(front);

    Matrix3::from_cols(right, up, front).transpose()
}

/// The scale-rotate over translate pair that places the mesh in the unit
/// sphere. Connectivity lines use a second chain kept identical to this one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformChain {
    pub scale_rotate: Transform,
    pub translate: Transform,
}

impl TransformChain {
    pub fn world_matrix(&self) -> Matrix4<f64> {
        self.scale_rotate.matrix * self.translate.matrix
    }

    pub fn reset(&mut self) {
        self.scale_rotate.reset();
        self.translate.reset();
    }
}

/// The mesh being annotated, with its picking index and GPU vertex data.
#[derive(Debug)]
pub struct MeshObject {
    geometry: GeometryData,
    octree: Octree,
    vertices: Vec<Vertex3D>,
    bounding_box: Aabb,
    bounding_sphere: BoundingSphere,
}

impl MeshObject {
    pub fn new(geometry: GeometryData, leaf_capacity: usize, max_depth: usize) -> Self {
        let octree = Octree::for_geometry(&geometry, leaf_capacity, max_depth);
        let vertices = Vertex3D::from_geometry(&geometry);
        let bounding_box = geometry.bounding_box();
        let bounding_sphere = geometry.bounding_sphere();
        Self {
            geometry,
            octree,
            vertices,
            bounding_box,
            bounding_sphere,
        }
    }

    pub fn geometry(&self) -> &GeometryData {
        &self.geometry
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    /// Offset that moves the bounding box center to the origin.
    pub fn centering(&self) -> Vector3<f64> {
        -self.bounding_box.center().to_vec()
    }

    pub fn center(&self) -> Point3<f64> {
        self.bounding_box.center()
    }
}
