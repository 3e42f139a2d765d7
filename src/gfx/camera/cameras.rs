//! Perspective and orthographic cameras sharing a common [`Pose`].

use cgmath::{
    Deg, EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, Quaternion, Rotation, SquareMatrix,
    Vector3,
};

use super::camera_utils::Camera;

/// Position and orientation of a camera. The camera looks down its local -Z
/// with local +Y as screen up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f64>,
    /// World up hint used when re-aiming
    pub up: Vector3<f64>,
    pub orientation: Quaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 1.0),
            up: Vector3::unit_y(),
            orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

impl Pose {
    /// Turn to face `target`, keeping `up` as screen up where possible.
    pub fn look_at(&mut self, target: Point3<f64>) {
        self.orientation = look_rotation(self.position - target, self.up);
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.orientation.rotate_vector(-Vector3::unit_z())
    }

    pub fn right(&self) -> Vector3<f64> {
        self.orientation.rotate_vector(Vector3::unit_x())
    }

    pub fn screen_up(&self) -> Vector3<f64> {
        self.orientation.rotate_vector(Vector3::unit_y())
    }

    /// Camera-local vector expressed in world space.
    pub fn to_world(&self, local: Vector3<f64>) -> Vector3<f64> {
        self.orientation.rotate_vector(local)
    }

    pub fn matrix_world(&self) -> Matrix4<f64> {
        Matrix4::from_translation(self.position.to_vec()) * Matrix4::from(self.orientation)
    }

    pub fn view_matrix(&self) -> Matrix4<f64> {
        self.matrix_world()
            .invert()
            .unwrap_or_else(Matrix4::identity)
    }
}

/// Rotation whose local +Z points along `back` with local +Y as close to `up`
/// as possible.
pub fn look_rotation(back: Vector3<f64>, up: Vector3<f64>) -> Quaternion<f64> {
    let z = if back.magnitude2() > 0.0 {
        back.normalize()
    } else {
        Vector3::unit_z()
    };

    let mut x = up.cross(z);
    if x.magnitude2() < 1e-12 {
        // up is parallel to the view direction; nudge it
        let fallback = if z.x.abs() < 0.9 {
            Vector3::unit_x()
        } else {
            Vector3::unit_y()
        };
        x = fallback.cross(z);
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quaternion::from(Matrix3::from_cols(x, y, z))
}

/// A symmetric perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub pose: Pose,
    pub fovy: Deg<f64>,
    pub aspect: f64,
    pub znear: f64,
    pub zfar: f64,
}

impl PerspectiveCamera {
    pub fn new(fovy: Deg<f64>, aspect: f64, znear: f64, zfar: f64) -> Self {
        Self {
            pose: Pose::default(),
            fovy,
            aspect,
            znear,
            zfar,
        }
    }
}

impl Camera for PerspectiveCamera {
    fn view_matrix(&self) -> Matrix4<f64> {
        self.pose.view_matrix()
    }

    fn projection_matrix(&self) -> Matrix4<f64> {
        cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    fn position(&self) -> Point3<f64> {
        self.pose.position
    }
}

/// An orthographic camera with explicit (possibly asymmetric) frustum bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicCamera {
    pub pose: Pose,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub znear: f64,
    pub zfar: f64,
}

impl OrthographicCamera {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64, znear: f64, zfar: f64) -> Self {
        Self {
            pose: Pose::default(),
            left,
            right,
            top,
            bottom,
            znear,
            zfar,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    /// Shift all four bounds, moving the view without touching the pose.
    pub fn shift(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }
}

impl Camera for OrthographicCamera {
    fn view_matrix(&self) -> Matrix4<f64> {
        self.pose.view_matrix()
    }

    fn projection_matrix(&self) -> Matrix4<f64> {
        cgmath::ortho(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.znear,
            self.zfar,
        )
    }

    fn position(&self) -> Point3<f64> {
        self.pose.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3<f64>, b: Vector3<f64>) {
        assert!((a - b).magnitude() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut pose = Pose {
            position: Point3::new(3.0, 0.0, 0.0),
            ..Pose::default()
        };
        pose.look_at(Point3::new(0.0, 0.0, 0.0));

        assert_close(pose.forward(), Vector3::new(-1.0, 0.0, 0.0));
        assert_close(pose.screen_up(), Vector3::unit_y());
    }

    #[test]
    fn test_look_at_with_parallel_up_stays_orthonormal() {
        let mut pose = Pose {
            position: Point3::new(0.0, 5.0, 0.0),
            ..Pose::default()
        };
        pose.look_at(Point3::new(0.0, 0.0, 0.0));
        assert_close(pose.forward(), Vector3::new(0.0, -1.0, 0.0));
        assert!(pose.right().dot(pose.forward()).abs() < 1e-9);
    }

    #[test]
    fn test_perspective_projects_target_to_center() {
        let mut camera = PerspectiveCamera::new(Deg(50.0), 1.5, 0.01, 20.0);
        camera.pose.position = Point3::new(0.0, 0.0, 3.0);
        camera.pose.look_at(Point3::new(0.0, 0.0, 0.0));

        let ndc = camera.project(Point3::new(0.0, 0.0, 0.0));
        assert!(ndc.x.abs() < 1e-9 && ndc.y.abs() < 1e-9);

        let back = camera.unproject(ndc);
        assert!((back - Point3::new(0.0, 0.0, 0.0)).magnitude() < 1e-9);
    }

    #[test]
    fn test_orthographic_maps_bounds_to_ndc_edges() {
        let mut camera = OrthographicCamera::new(-2.0, 2.0, 1.0, -1.0, -10.0, 10.0);
        camera.pose.look_at(Point3::new(0.0, 0.0, 0.0));

        let corner = camera.project(Point3::new(2.0, 1.0, 0.0));
        assert!((corner.x - 1.0).abs() < 1e-9);
        assert!((corner.y - 1.0).abs() < 1e-9);

        camera.shift(2.0, 0.0);
        let shifted = camera.project(Point3::new(2.0, 1.0, 0.0));
        assert!(shifted.x.abs() < 1e-9);
    }
}
