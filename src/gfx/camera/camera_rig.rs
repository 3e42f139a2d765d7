//! # Camera Rig
//!
//! One perspective, one orthographic and one picture-in-picture camera that
//! always share a pose. Every geometric operation goes through the rig so the
//! three can never drift apart, and switching [`CameraMode`] is instant.
//!
//! Screen coordinates are pixels from the top-left corner of the viewport,
//! y pointing down.

use cgmath::{
    Deg, InnerSpace, Point2, Point3, Quaternion, Rad, Rotation, Rotation3, Vector2, Vector3, Zero,
};

use super::camera_utils::Camera;
use super::cameras::{OrthographicCamera, PerspectiveCamera, Pose};
use crate::config::CameraSettings;

const DEFAULT_DISTANCE: f64 = 2.5;
const DEFAULT_FOV: f64 = 50.0;
const ORTHO_HALF_HEIGHT: f64 = 1.1;
const NEAR: f64 = 0.001;
const FAR: f64 = 100.0;

/// Which camera family renders the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Perspective,
    Orthographic,
}

/// Camera state captured at construction, restored by [`CameraRig::reset`].
#[derive(Debug, Clone, Copy)]
struct Origin {
    perspective: PerspectiveCamera,
    orthographic: OrthographicCamera,
    target: Point3<f64>,
}

/// The PIP camera and the pixel rectangle it renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipView<'a> {
    pub camera: &'a OrthographicCamera,
    /// `[x, y, width, height]` in pixels
    pub viewport: [f64; 4],
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    perspective: PerspectiveCamera,
    orthographic: OrthographicCamera,
    pip: OrthographicCamera,
    mode: CameraMode,
    target: Point3<f64>,
    can_rotate: bool,
    origin: Origin,
    width: f64,
    height: f64,
    last_axis: Vector3<f64>,
    last_angle: f64,
    hover: Option<Point2<f64>>,
    settings: CameraSettings,
}

impl CameraRig {
    pub fn new(width: f64, height: f64, settings: CameraSettings) -> Self {
        let (width, height) = clamp_size(width, height);
        let aspect = width / height;
        let target = Point3::new(0.0, 0.0, 0.0);

        let mut pose = Pose {
            position: Point3::new(0.0, 0.0, DEFAULT_DISTANCE),
            ..Pose::default()
        };
        pose.look_at(target);

        let mut perspective = PerspectiveCamera::new(Deg(DEFAULT_FOV), aspect, NEAR, FAR);
        perspective.pose = pose;

        // a negative near plane keeps geometry behind the eye visible when zoomed in
        let mut orthographic = OrthographicCamera::new(
            -ORTHO_HALF_HEIGHT * aspect,
            ORTHO_HALF_HEIGHT * aspect,
            ORTHO_HALF_HEIGHT,
            -ORTHO_HALF_HEIGHT,
            -FAR,
            FAR,
        );
        orthographic.pose = pose;

        let mut rig = Self {
            perspective,
            orthographic,
            pip: orthographic,
            mode: CameraMode::Perspective,
            target,
            can_rotate: true,
            origin: Origin {
                perspective,
                orthographic,
                target,
            },
            width,
            height,
            last_axis: Vector3::zero(),
            last_angle: 0.0,
            hover: None,
            settings,
        };
        rig.update_pip();
        rig
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
    }

    pub fn perspective(&self) -> &PerspectiveCamera {
        &self.perspective
    }

    pub fn orthographic(&self) -> &OrthographicCamera {
        &self.orthographic
    }

    /// The camera rendering the main view in the current mode.
    pub fn active(&self) -> &dyn Camera {
        match self.mode {
            CameraMode::Perspective => &self.perspective,
            CameraMode::Orthographic => &self.orthographic,
        }
    }

    pub fn pose(&self) -> Pose {
        self.perspective.pose
    }

    pub fn target(&self) -> Point3<f64> {
        self.target
    }

    pub fn can_rotate(&self) -> bool {
        self.can_rotate
    }

    pub fn set_can_rotate(&mut self, can_rotate: bool) {
        self.can_rotate = can_rotate;
        if !can_rotate {
            self.last_angle = 0.0;
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn distance(&self) -> f64 {
        (self.perspective.pose.position - self.target).magnitude()
    }

    /// Residual inertial rotation still to be played out.
    pub fn is_spinning(&self) -> bool {
        self.can_rotate && self.last_angle > 0.0
    }

    fn set_pose(&mut self, pose: Pose) {
        self.perspective.pose = pose;
        self.orthographic.pose = pose;
        self.pip.pose = pose;
    }

    pub fn to_ndc(&self, screen: Point2<f64>) -> Point2<f64> {
        Point2::new(
            screen.x / self.width * 2.0 - 1.0,
            -(screen.y / self.height * 2.0 - 1.0),
        )
    }

    pub fn to_screen(&self, ndc: Point2<f64>) -> Point2<f64> {
        Point2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }

    /// Project a world point with the active camera into pixel coordinates.
    pub fn world_to_screen(&self, world: Point3<f64>) -> Point2<f64> {
        let ndc = self.active().project(world);
        self.to_screen(Point2::new(ndc.x, ndc.y))
    }

    /// Translate the view by a pixel delta. The orthographic bounds absorb the
    /// difference so content under the cursor follows it exactly.
    pub fn pan(&mut self, delta: Vector2<f64>) {
        let mut pose = self.pose();
        let distance = self.distance();
        let v = pose.to_world(Vector3::new(-delta.x, delta.y, 0.0))
            * distance
            * self.settings.pan_speed;

        let along_right = v.dot(pose.right());
        let along_up = v.dot(pose.screen_up());

        pose.position += v;
        self.target += v;
        self.set_pose(pose);

        let ortho = &mut self.orthographic;
        let dx = -delta.x * ortho.width() / self.width;
        let dy = delta.y * ortho.height() / self.height;
        ortho.shift(dx - along_right, dy - along_up);

        self.update_pip();
    }

    /// Zoom by `amount` wheel units (positive zooms in) about the cursor.
    ///
    /// The perspective camera dollies towards the target. The orthographic
    /// frustum contracts around the cursor so the point beneath it stays put.
    pub fn zoom(&mut self, amount: f64, cursor: Point2<f64>) {
        let mut pose = self.pose();
        let distance = self.distance();
        let step = amount * distance * self.settings.zoom_speed;
        let new_distance = (distance - step).max(self.settings.min_distance);
        pose.position += pose.forward() * (distance - new_distance);
        self.set_pose(pose);

        let fx = (cursor.x / self.width).clamp(0.0, 1.0);
        let fy = (cursor.y / self.height).clamp(0.0, 1.0);
        let s = amount * self.settings.ortho_zoom_speed;
        let min_extent = self.settings.min_frustum_extent;

        let ortho = &mut self.orthographic;
        let (w, h) = (ortho.width(), ortho.height());
        ortho.left += w * s * fx;
        ortho.right -= w * s * (1.0 - fx);
        ortho.top -= h * s * fy;
        ortho.bottom += h * s * (1.0 - fy);

        if ortho.right - ortho.left < min_extent {
            ortho.left = ortho.right - min_extent;
        }
        if ortho.top - ortho.bottom < min_extent {
            ortho.bottom = ortho.top - min_extent;
        }

        self.update_pip();
    }

    /// Arcball rotation about the target by a pixel delta.
    ///
    /// A zero delta plays out the residual spin from the last rotation,
    /// damped each call. Returns whether the view changed.
    pub fn rotate(&mut self, delta: Vector2<f64>) -> bool {
        if !self.can_rotate {
            return false;
        }

        let mut pose = self.pose();
        let eye = pose.position - self.target;

        let (axis, angle) = if delta.is_zero() {
            if self.last_angle == 0.0 {
                return false;
            }
            self.last_angle *= (1.0 - self.settings.damping_factor).sqrt();
            if self.last_angle < self.settings.inertia_epsilon {
                self.last_angle = 0.0;
                return false;
            }
            (self.last_axis, self.last_angle)
        } else {
            let movement = Vector2::new(delta.x, -delta.y) * (2.0 / self.width);
            let eye_direction = eye.normalize();
            let up = pose.screen_up();
            let sideways = up.cross(eye_direction).normalize();
            let move_direction = up * movement.y + sideways * movement.x;

            let axis = move_direction.cross(eye);
            if axis.magnitude2() == 0.0 {
                return false;
            }
            let axis = axis.normalize();
            let angle = movement.magnitude() * self.settings.rotate_speed;
            self.last_axis = axis;
            self.last_angle = angle;
            (axis, angle)
        };

        let rotation = Quaternion::from_axis_angle(axis, Rad(angle));
        pose.position = self.target + rotation.rotate_vector(eye);
        pose.up = rotation.rotate_vector(pose.up);
        pose.orientation = (rotation * pose.orientation).normalize();
        self.set_pose(pose);
        self.update_pip();
        true
    }

    /// Drop any residual spin.
    pub fn stop(&mut self) {
        self.last_angle = 0.0;
    }

    /// Re-target the view on `point`, keeping the current offset and zoom.
    pub fn focus(&mut self, point: Point3<f64>) {
        let mut pose = self.pose();
        pose.position += point - self.target;
        self.target = point;
        self.set_pose(pose);

        let ortho = &mut self.orthographic;
        let (cx, cy) = ortho.center();
        ortho.shift(-cx, -cy);
        self.update_pip();
    }

    /// Restore the construction-time cameras, then place the eye at `position`
    /// looking at `target`.
    pub fn reset(&mut self, position: Point3<f64>, target: Point3<f64>, can_rotate: bool) {
        self.perspective = self.origin.perspective;
        self.orthographic = self.origin.orthographic;
        self.target = self.origin.target;

        let mut pose = self.perspective.pose;
        pose.position = position;
        pose.look_at(target);
        self.set_pose(pose);

        self.target = target;
        self.can_rotate = can_rotate;
        self.last_angle = 0.0;

        let (width, height) = (self.width, self.height);
        self.resize(width, height);
    }

    /// Adapt to a new viewport size. The orthographic frustum keeps its center
    /// and vertical extent.
    pub fn resize(&mut self, width: f64, height: f64) {
        let (width, height) = clamp_size(width, height);
        self.width = width;
        self.height = height;
        let aspect = width / height;
        self.perspective.aspect = aspect;

        let ortho = &mut self.orthographic;
        let (cx, _) = ortho.center();
        let half_width = ortho.height() * aspect * 0.5;
        ortho.left = cx - half_width;
        ortho.right = cx + half_width;

        self.update_pip();
    }

    /// Track the cursor for the picture-in-picture view. `None` when the
    /// pointer leaves the viewport.
    pub fn set_hover(&mut self, cursor: Option<Point2<f64>>) {
        self.hover = cursor;
        self.update_pip();
    }

    fn update_pip(&mut self) {
        let Some(cursor) = self.hover else {
            return;
        };
        let ortho = &self.orthographic;
        let cx = ortho.left + cursor.x / self.width * ortho.width();
        let cy = ortho.top - cursor.y / self.height * ortho.height();
        let half = ortho.height() / self.settings.pip_zoom_factor * 0.5;

        self.pip.left = cx - half;
        self.pip.right = cx + half;
        self.pip.top = cy + half;
        self.pip.bottom = cy - half;
    }

    /// The zoomed inset around the cursor, only shown in orthographic mode.
    pub fn pip(&self) -> Option<PipView<'_>> {
        if self.mode != CameraMode::Orthographic {
            return None;
        }
        let cursor = self.hover?;
        let size = self.height * self.settings.pip_size;
        let x = (cursor.x - size * 0.5).clamp(0.0, (self.width - size).max(0.0));
        let y = (cursor.y - size * 0.5).clamp(0.0, (self.height - size).max(0.0));
        Some(PipView {
            camera: &self.pip,
            viewport: [x, y, size, size],
        })
    }
}

/// A collapsed or not-yet-laid-out viewport still counts as one pixel so the
/// aspect ratio and pixel-to-world conversions stay finite.
fn clamp_size(width: f64, height: f64) -> (f64, f64) {
    let clamp = |size: f64| if size.is_finite() { size.max(1.0) } else { 1.0 };
    (clamp(width), clamp(height))
}
