use cgmath::{EuclideanSpace, MetricSpace, Point2, Vector2, Zero};

use super::camera_rig::CameraRig;
use crate::interaction::{DocumentListeners, Listener, MouseButton, MouseScrollDelta};

/// Wheel units per scrolled line.
const WHEEL_LINE: f64 = 100.0;
/// Wheel units per pixel of zoom drag or pinch.
const DRAG_ZOOM: f64 = 4.0;

/// What the current press or touch is doing to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    None,
    Rotate,
    Zoom,
    Pan,
}

/// Turns pointer and touch input into [`CameraRig`] operations.
#[derive(Debug, Clone)]
pub struct CameraController {
    rig: CameraRig,
    state: CameraState,
    enabled: bool,
    last: Point2<f64>,
    zoom_anchor: Point2<f64>,
    /// Finger positions as of the previous touch event
    touches: Vec<Point2<f64>>,
}

impl CameraController {
    pub fn new(rig: CameraRig) -> Self {
        Self {
            rig,
            state: CameraState::None,
            enabled: true,
            last: Point2::origin(),
            zoom_anchor: Point2::origin(),
            touches: Vec::new(),
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop reacting to input. An ongoing drag is abandoned and its document
    /// listener removed.
    pub fn disable(&mut self, listeners: &mut DocumentListeners) {
        self.enabled = false;
        self.end_drag(listeners);
        self.rig.stop();
    }

    fn end_drag(&mut self, listeners: &mut DocumentListeners) {
        if self.state != CameraState::None {
            log::trace!("camera {:?} ended", self.state);
        }
        self.state = CameraState::None;
        self.touches.clear();
        listeners.detach(Listener::CameraDrag);
    }

    fn one_finger_state(&self) -> CameraState {
        if self.rig.can_rotate() {
            CameraState::Rotate
        } else {
            CameraState::Pan
        }
    }

    pub fn on_mouse_down(
        &mut self,
        button: MouseButton,
        position: Point2<f64>,
        listeners: &mut DocumentListeners,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        self.state = match button {
            MouseButton::Left => self.one_finger_state(),
            MouseButton::Middle => CameraState::Zoom,
            MouseButton::Right => CameraState::Pan,
            _ => return false,
        };
        self.last = position;
        self.zoom_anchor = position;
        self.rig.stop();
        listeners.attach(Listener::CameraDrag);
        true
    }

    /// Returns true if the camera moved.
    pub fn on_mouse_move(&mut self, position: Point2<f64>, listeners: &DocumentListeners) -> bool {
        if !self.enabled || !listeners.is_attached(Listener::CameraDrag) {
            return false;
        }
        let delta = position - self.last;
        self.last = position;
        self.apply(delta, self.zoom_anchor)
    }

    pub fn on_mouse_up(&mut self, listeners: &mut DocumentListeners) {
        self.end_drag(listeners);
    }

    fn apply(&mut self, delta: Vector2<f64>, anchor: Point2<f64>) -> bool {
        if delta.is_zero() {
            return false;
        }
        match self.state {
            CameraState::None => false,
            CameraState::Rotate => self.rig.rotate(delta),
            CameraState::Zoom => {
                self.rig.zoom(-delta.y * DRAG_ZOOM, anchor);
                true
            }
            CameraState::Pan => {
                self.rig.pan(delta);
                true
            }
        }
    }

    pub fn on_wheel(&mut self, delta: MouseScrollDelta, cursor: Point2<f64>) -> bool {
        if !self.enabled {
            return false;
        }
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64 * WHEEL_LINE,
            MouseScrollDelta::PixelDelta(position) => position.y,
        };
        if amount == 0.0 {
            return false;
        }
        self.rig.zoom(amount, cursor);
        true
    }

    /// Track the hovering cursor for the PIP view. Returns true if the PIP
    /// is showing and needs a redraw.
    pub fn on_hover(&mut self, cursor: Option<Point2<f64>>) -> bool {
        self.rig.set_hover(cursor);
        self.rig.pip().is_some() || cursor.is_none()
    }

    /// Feed the positions of every finger currently down, after any touch
    /// event. One finger rotates (or pans when rotation is off), two pinch
    /// to zoom about their center, three pan. A change in finger count only
    /// re-anchors the gesture.
    pub fn on_touches(
        &mut self,
        touches: &[Point2<f64>],
        listeners: &mut DocumentListeners,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        if touches.is_empty() {
            self.end_drag(listeners);
            return false;
        }
        if touches.len() != self.touches.len() {
            self.state = match touches.len() {
                1 => self.one_finger_state(),
                2 => CameraState::Zoom,
                3 => CameraState::Pan,
                _ => CameraState::None,
            };
            self.touches = touches.to_vec();
            self.rig.stop();
            listeners.attach(Listener::CameraDrag);
            return false;
        }

        let previous = std::mem::replace(&mut self.touches, touches.to_vec());
        match self.state {
            CameraState::Rotate | CameraState::Pan if touches.len() == 1 => {
                self.apply(touches[0] - previous[0], touches[0])
            }
            CameraState::Zoom => {
                let gap = touches[0].distance(touches[1]);
                let previous_gap = previous[0].distance(previous[1]);
                let center = touches[0].midpoint(touches[1]);
                if gap == previous_gap {
                    return false;
                }
                self.rig.zoom((gap - previous_gap) * DRAG_ZOOM, center);
                true
            }
            CameraState::Pan => {
                let delta = centroid(touches) - centroid(&previous);
                self.apply(delta, touches[0])
            }
            _ => false,
        }
    }

    /// Advance inertial rotation by one frame. Returns true while spinning.
    pub fn tick(&mut self) -> bool {
        if !self.enabled || self.state == CameraState::Rotate {
            return false;
        }
        self.rig.rotate(Vector2::zero())
    }
}

fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    Point2::centroid(points)
}
