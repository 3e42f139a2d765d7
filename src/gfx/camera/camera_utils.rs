use cgmath::{Matrix4, Point3, SquareMatrix, Transform};

/// Maps OpenGL clip depth (-1..1) onto the 0..1 range GPU backends expect.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f64> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Anything that can project the world onto the screen.
///
/// Projection and unprojection work in OpenGL-style normalized device
/// coordinates: x and y in -1..1 with y up, z from -1 (near) to 1 (far).
pub trait Camera {
    fn view_matrix(&self) -> Matrix4<f64>;

    fn projection_matrix(&self) -> Matrix4<f64>;

    fn position(&self) -> Point3<f64>;

    fn build_view_projection_matrix(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to normalized device coordinates.
    fn project(&self, world: Point3<f64>) -> Point3<f64> {
        self.build_view_projection_matrix().transform_point(world)
    }

    /// Normalized device coordinates back to a world point.
    fn unproject(&self, ndc: Point3<f64>) -> Point3<f64> {
        let inverse = self
            .build_view_projection_matrix()
            .invert()
            .unwrap_or_else(Matrix4::identity);
        inverse.transform_point(ndc)
    }

    fn uniform(&self) -> CameraUniform {
        let p = self.position();
        CameraUniform {
            view_position: [p.x as f32, p.y as f32, p.z as f32, 1.0],
            view_proj: convert_matrix4_to_array(
                OPENGL_TO_WGPU_MATRIX * self.build_view_projection_matrix(),
            ),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

/// Column-major `f32` copy of a matrix, ready for a uniform buffer.
pub fn convert_matrix4_to_array(matrix4: Matrix4<f64>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for (i, column) in result.iter_mut().enumerate() {
        for (j, value) in column.iter_mut().enumerate() {
            *value = matrix4[i][j] as f32;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_keeps_column_major_layout() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let array = convert_matrix4_to_array(m);
        assert_eq!(array[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(array[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uniform_is_pod() {
        let uniform = CameraUniform::default();
        let bytes: &[u8] = bytemuck::bytes_of(&uniform);
        assert_eq!(bytes.len(), 80);
    }
}
