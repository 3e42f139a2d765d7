//! # Primitive Shape Generation
//!
//! Procedural meshes: a cube for tests, a UV sphere (also the landmark symbol
//! shape) and a subdivided plane, which doubles as the canvas for 2D image assets.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a unit cube centered at the origin
///
/// Vertices span -0.5 to 0.5 on all axes; each face has its own four corners
/// so normals stay flat.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    // (normal, u axis, v axis) per face; u x v == normal keeps winding outward
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    for (normal, u, v) in faces {
        let base = data.vertices.len() as u32;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let position = [
                normal[0] * 0.5 + u[0] * su + v[0] * sv,
                normal[1] * 0.5 + u[1] * su + v[1] * sv,
                normal[2] * 0.5 + u[2] * su + v[2] * sv,
            ];
            data.vertices.push(position);
            data.normals.push(normal);
            data.tex_coords.push([su + 0.5, sv + 0.5]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius 1.0 centered at the origin.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let point = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices.push(point);
            data.normals.push(point);
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, second, first + 1]);
            data.indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            data.vertices.push([(u - 0.5) * width, (v - 0.5) * height, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            data.tex_coords.push([u, v]);
        }
    }

    // Counter-clockwise seen from +Z
    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;
            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// A plane covering an image in pixel units: x right, y up, origin at the
/// image's bottom-left corner.
pub fn generate_image_plane(width_px: u32, height_px: u32) -> GeometryData {
    let mut data = generate_plane(width_px as f32, height_px as f32, 1, 1);
    for vertex in &mut data.vertices {
        vertex[0] += width_px as f32 * 0.5;
        vertex[1] += height_px as f32 * 0.5;
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = generate_cube();
        for face in 0..cube.triangle_count() {
            let [a, b, c] = cube.triangle(face);
            let normal = (b - a).cross(c - a);
            let center = (a.x + b.x + c.x, a.y + b.y + c.y, a.z + b.z + c.z);
            let outward = normal.x * center.0 + normal.y * center.1 + normal.z * center.2;
            assert!(outward > 0.0, "face {} winds inward", face);
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert!(!sphere.vertices.is_empty());
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
        assert_eq!(sphere.triangle_count(), 8 * 6 * 2);
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
    }

    #[test]
    fn test_image_plane_covers_pixels() {
        let plane = generate_image_plane(640, 480);
        let bounds = plane.bounding_box();
        assert_eq!(bounds.min.x, 0.0);
        assert_eq!(bounds.min.y, 0.0);
        assert_eq!(bounds.max.x, 640.0);
        assert_eq!(bounds.max.y, 480.0);
    }
}
