//! # Vertex Data Structures
//!
//! GPU vertex layout for the annotated mesh.

use crate::gfx::geometry::GeometryData;

/// A mesh vertex with position, normal and texture coordinates.
///
/// `#[repr(C)]` keeps the layout stable for vertex buffer uploads.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Zero when the geometry carries no texture coordinates
    pub tex_coords: [f32; 2],
}

impl Vertex3D {
    /// Interleave a geometry's attributes, computing normals if it has none.
    pub fn from_geometry(geometry: &GeometryData) -> Vec<Self> {
        let computed;
        let normals = if geometry.normals.len() == geometry.vertices.len() {
            &geometry.normals
        } else {
            computed = geometry.compute_vertex_normals();
            &computed
        };

        geometry
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: normals[i],
                tex_coords: geometry.tex_coords.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;

    #[test]
    fn test_interleaves_every_vertex() {
        let mut cube = generate_cube();
        cube.normals.clear();
        let vertices = Vertex3D::from_geometry(&cube);
        assert_eq!(vertices.len(), cube.vertex_count());
        assert!(vertices.iter().all(|v| {
            let n = v.normal;
            ((n[0] * n[0] + n[1] * n[1] + n[2] * n[2]) - 1.0).abs() < 1e-5
        }));
        assert_eq!(bytemuck::cast_slice::<_, u8>(&vertices).len(), vertices.len() * 32);
    }
}
