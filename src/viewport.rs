//! # Viewport
//!
//! The façade an embedding application drives: it forwards window input to
//! the gesture handlers, keeps the scene's landmark symbols in step with the
//! landmark state, and produces [`Frame`]s for the renderer.
//!
//! Every input event runs inside an atomic operation, so however many
//! landmarks a gesture step touches, at most one frame is rendered for it.
//!
//! ## Usage
//!
//! ```rust
//! use landmarker::config::Settings;
//! use landmarker::gfx::geometry::generate_sphere;
//! use landmarker::gfx::scene::Asset;
//! use landmarker::interaction::{MouseButton, PointerEvent, ViewportCallbacks};
//! use landmarker::model::{GroupKey, LandmarkGroup, LandmarkTracker};
//! use landmarker::viewport::Viewport;
//!
//! let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
//! viewport.set_asset(&Asset::mesh("ball", generate_sphere(32, 16))).unwrap();
//!
//! let mut group = LandmarkGroup::new(
//!     GroupKey::new("ball", "face"),
//!     vec![None; 3],
//!     3,
//!     vec![[0, 1]],
//!     Vec::new(),
//!     LandmarkTracker::default(),
//! )
//! .unwrap();
//! viewport.set_landmarks(group.landmarks(), group.connectivity());
//!
//! // clicking the mesh fills the next available slot
//! let click = PointerEvent::new(400.0, 300.0, MouseButton::Left);
//! viewport.mouse_down(&mut group, &click);
//! viewport.mouse_up(&mut group, &click);
//! assert!(group.landmark(0).is_some_and(|lm| !lm.is_empty()));
//! ```

use std::time::Instant;

use cgmath::{Point2, Point3};

use crate::config::Settings;
use crate::error::Result;
use crate::gfx::camera::camera_utils::convert_matrix4_to_array;
use crate::gfx::camera::{Camera, CameraController, CameraMode, CameraRig};
use crate::gfx::rendering::{Frame, Overlay, PipFrame};
use crate::gfx::scene::{Asset, AssetKind, SceneManager};
use crate::interaction::{
    AtomicOperation, DocumentListeners, InteractionContext, MouseHandler, MouseScrollDelta,
    PointerEvent, TouchHandler, TouchPoint, ViewportCallbacks,
};
use crate::model::Landmark;

const HOME_POSITION: Point3<f64> = Point3::new(0.0, 0.0, 2.5);
const HOME_TARGET: Point3<f64> = Point3::new(0.0, 0.0, 0.0);

pub struct Viewport {
    settings: Settings,
    scene: SceneManager,
    camera: CameraController,
    mouse: MouseHandler,
    touch: TouchHandler,
    listeners: DocumentListeners,
    atomic: AtomicOperation,
    overlay: Overlay,
    asset_kind: Option<AssetKind>,
    editing: bool,
    enabled: bool,
    frames: u64,
    last_frame: Option<Frame>,
}

impl Viewport {
    pub fn new(width: f64, height: f64, settings: Settings) -> Self {
        let rig = CameraRig::new(width, height, settings.camera.clone());
        Self {
            scene: SceneManager::new(settings.scene.clone()),
            camera: CameraController::new(rig),
            mouse: MouseHandler::new(),
            touch: TouchHandler::new(),
            listeners: DocumentListeners::new(),
            atomic: AtomicOperation::new(),
            overlay: Overlay::default(),
            asset_kind: None,
            editing: false,
            enabled: true,
            frames: 0,
            last_frame: None,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn rig(&self) -> &CameraRig {
        self.camera.rig()
    }

    pub fn listeners(&self) -> &DocumentListeners {
        &self.listeners
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn mouse(&self) -> &MouseHandler {
        &self.mouse
    }

    pub fn touch_handler(&self) -> &TouchHandler {
        &self.touch
    }

    /// A handle on the render suppression state, for batching programmatic
    /// updates from outside.
    pub fn atomic(&self) -> AtomicOperation {
        self.atomic.clone()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Run `f` as one atomic operation, rendering once afterwards if anything
    /// inside asked for a render.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let guard = self.atomic.begin();
        let result = f(self);
        drop(guard);
        if self.atomic.take_pending() {
            self.render();
        }
        result
    }

    fn request_render(&mut self) {
        if self.atomic.request_render() {
            self.render();
        }
    }

    /// Show a new asset. Images get a fixed orthographic view; meshes can be
    /// rotated.
    pub fn set_asset(&mut self, asset: &Asset) -> Result<()> {
        self.scene.set_mesh(asset)?;
        self.asset_kind = Some(asset.kind);
        log::info!("viewport showing asset '{}'", asset.id);

        self.batch(|vp| {
            vp.mouse.reset();
            vp.overlay.clear();
            if asset.is_image() {
                vp.camera.rig_mut().set_mode(CameraMode::Orthographic);
            }
            vp.reset_camera();
        });
        Ok(())
    }

    pub fn clear_asset(&mut self) {
        self.scene.clear_mesh();
        self.asset_kind = None;
        self.request_render();
    }

    /// Rebuild every landmark symbol and connectivity line.
    pub fn set_landmarks(&mut self, landmarks: &[Landmark], connectivity: &[[usize; 2]]) {
        self.scene
            .set_landmarks_and_connectivity(landmarks, connectivity);
        self.request_render();
    }

    /// Patch the symbols of changed landmarks. Returns their indices.
    pub fn update_landmarks(&mut self, landmarks: &[Landmark]) -> Vec<usize> {
        let changed = self.scene.update_landmarks(landmarks);
        if !changed.is_empty() {
            self.request_render();
        }
        changed
    }

    pub fn set_editing(&mut self, editing: bool) {
        if self.editing == editing {
            return;
        }
        self.editing = editing;
        if !editing && !self.overlay.guides.is_empty() {
            self.overlay.guides.clear();
            self.request_render();
        }
    }

    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        if self.camera.rig().mode() != mode {
            self.camera.rig_mut().set_mode(mode);
            self.request_render();
        }
    }

    /// Put the camera back in front of the asset.
    pub fn reset_camera(&mut self) {
        let can_rotate = !matches!(self.asset_kind, Some(AssetKind::Image { .. }));
        self.camera
            .rig_mut()
            .reset(HOME_POSITION, HOME_TARGET, can_rotate);
        self.request_render();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.camera.rig_mut().resize(width, height);
        self.request_render();
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.camera.enable();
    }

    /// Stop handling input. Any gesture in progress is abandoned and every
    /// document listener detached; landmark state is left as it is.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.camera.disable(&mut self.listeners);
        self.listeners.detach_all();
        self.mouse.reset();
        self.touch.reset();
        if !self.overlay.is_empty() {
            self.overlay.clear();
            self.request_render();
        }
    }

    /// Run a gesture handler against the current state, then sync the
    /// scene's symbols with whatever it changed.
    fn dispatch(
        &mut self,
        callbacks: &mut dyn ViewportCallbacks,
        f: impl FnOnce(&mut MouseHandler, &mut TouchHandler, &mut InteractionContext) -> bool,
    ) {
        let mut ctx = InteractionContext {
            scene: &self.scene,
            camera: &mut self.camera,
            listeners: &mut self.listeners,
            overlay: &mut self.overlay,
            callbacks: &mut *callbacks,
            settings: &self.settings.interaction,
            editing: self.editing,
        };
        let mut redraw = f(&mut self.mouse, &mut self.touch, &mut ctx);

        redraw |= !self.scene.update_landmarks(callbacks.landmarks()).is_empty();
        if redraw {
            self.request_render();
        }
    }

    pub fn mouse_down(&mut self, callbacks: &mut dyn ViewportCallbacks, event: &PointerEvent) {
        if !self.enabled {
            return;
        }
        self.batch(|vp| {
            vp.dispatch(callbacks, |mouse, _, ctx| mouse.on_mouse_down(ctx, event));
        });
    }

    pub fn mouse_move(&mut self, callbacks: &mut dyn ViewportCallbacks, event: &PointerEvent) {
        if !self.enabled {
            return;
        }
        self.batch(|vp| {
            if vp.camera.on_hover(Some(event.position)) {
                vp.request_render();
            }
            vp.dispatch(callbacks, |mouse, _, ctx| mouse.on_mouse_move(ctx, event));
        });
    }

    pub fn mouse_up(&mut self, callbacks: &mut dyn ViewportCallbacks, event: &PointerEvent) {
        if !self.enabled {
            return;
        }
        self.batch(|vp| {
            vp.dispatch(callbacks, |mouse, _, ctx| mouse.on_mouse_up(ctx, event));
        });
    }

    pub fn wheel(&mut self, delta: MouseScrollDelta, cursor: Point2<f64>) {
        if !self.enabled {
            return;
        }
        if self.camera.on_wheel(delta, cursor) {
            self.request_render();
        }
    }

    /// Cursor entered, moved over, or (`None`) left the viewport with no
    /// button held.
    pub fn hover(&mut self, cursor: Option<Point2<f64>>) {
        if self.camera.on_hover(cursor) {
            self.request_render();
        }
    }

    pub fn touch(&mut self, callbacks: &mut dyn ViewportCallbacks, touch: &TouchPoint, now: Instant) {
        if !self.enabled {
            return;
        }
        self.batch(|vp| {
            vp.dispatch(callbacks, |_, handler, ctx| handler.on_touch(ctx, touch, now));
        });
    }

    /// Advance per-frame animation. Returns true while the camera is still
    /// spinning down.
    pub fn tick(&mut self) -> bool {
        let spinning = self.camera.tick();
        if spinning {
            self.request_render();
        }
        spinning
    }

    /// Produce a frame from the current state.
    pub fn render(&mut self) -> &Frame {
        self.frames += 1;
        let rig = self.camera.rig();
        let pip = rig.pip().map(|pip| PipFrame {
            camera: pip.camera.uniform(),
            viewport: pip.viewport.map(|v| v as f32),
        });

        let frame = Frame {
            number: self.frames,
            mode: rig.mode(),
            camera: rig.active().uniform(),
            pip,
            model: convert_matrix4_to_array(self.scene.world_matrix()),
            landmarks: self.scene.landmark_instances(),
            lines: self.scene.line_instances(),
            overlay: self.overlay.clone(),
        };
        log::trace!("rendered frame {}", frame.number);
        self.last_frame.insert(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::{generate_plane, generate_sphere};
    use crate::interaction::{MouseButton, TouchPhase};
    use crate::model::{GroupKey, LandmarkGroup, LandmarkTracker};

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
        viewport
            .set_asset(&Asset::mesh("plane", generate_plane(2.0, 2.0, 4, 4)))
            .unwrap();
        viewport
    }

    fn group(points: Vec<Option<Point3<f64>>>) -> LandmarkGroup {
        LandmarkGroup::new(
            GroupKey::new("plane", "t"),
            points,
            3,
            Vec::new(),
            Vec::new(),
            LandmarkTracker::default(),
        )
        .unwrap()
    }

    fn left(at: Point2<f64>) -> PointerEvent {
        PointerEvent::new(at.x, at.y, MouseButton::Left)
    }

    #[test]
    fn test_drag_step_renders_once() {
        let mut viewport = viewport();
        let mut group = group(vec![
            Some(Point3::new(-0.2, 0.0, 0.0)),
            Some(Point3::new(0.2, 0.0, 0.0)),
        ]);
        group.select_all();
        viewport.set_landmarks(group.landmarks(), group.connectivity());
        let start = viewport
            .scene()
            .local_to_screen(viewport.rig(), Point3::new(-0.2, 0.0, 0.0));

        viewport.mouse_down(&mut group, &left(start));
        let before = viewport.frames_rendered();
        viewport.mouse_move(&mut group, &left(Point2::new(start.x + 10.0, start.y)));

        // two landmarks moved, one frame
        assert_eq!(viewport.frames_rendered(), before + 1);
        let frame = viewport.last_frame().unwrap();
        assert_eq!(frame.landmarks.len(), 2);
        viewport.mouse_up(&mut group, &left(Point2::new(start.x + 10.0, start.y)));
    }

    #[test]
    fn test_batch_coalesces_programmatic_updates() {
        let mut viewport = viewport();
        let mut group = group(vec![None, None, None]);
        viewport.set_landmarks(group.landmarks(), group.connectivity());
        let before = viewport.frames_rendered();

        viewport.batch(|vp| {
            for i in 0..3 {
                group.insert_new(Point3::new(i as f64 * 0.1, 0.0, 0.0));
                vp.update_landmarks(group.landmarks());
            }
            assert_eq!(vp.frames_rendered(), before);
        });
        assert_eq!(viewport.frames_rendered(), before + 1);
        assert_eq!(viewport.last_frame().unwrap().landmarks.len(), 3);
    }

    #[test]
    fn test_disable_mid_drag_detaches_everything() {
        let mut viewport = viewport();
        let mut group = group(vec![Some(Point3::new(0.0, 0.0, 0.0))]);
        viewport.set_landmarks(group.landmarks(), group.connectivity());
        let start = viewport
            .scene()
            .local_to_screen(viewport.rig(), Point3::new(0.0, 0.0, 0.0));

        viewport.mouse_down(&mut group, &left(start));
        assert!(!viewport.listeners().is_empty());
        viewport.disable();

        assert!(viewport.listeners().is_empty());
        assert!(!viewport.mouse().is_pressed());
        let ops = group.tracker().operation_count();
        viewport.mouse_move(&mut group, &left(Point2::new(start.x + 30.0, start.y)));
        viewport.mouse_up(&mut group, &left(Point2::new(start.x + 30.0, start.y)));
        assert_eq!(
            group.landmark(0).and_then(|lm| lm.point()),
            Some(Point3::new(0.0, 0.0, 0.0))
        );
        assert_eq!(group.tracker().operation_count(), ops);

        viewport.enable();
        assert!(viewport.camera().is_enabled());
    }

    #[test]
    fn test_image_assets_are_flat_and_fixed() {
        let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
        viewport.set_asset(&Asset::image("scan", 640, 480)).unwrap();

        assert_eq!(viewport.rig().mode(), CameraMode::Orthographic);
        assert!(!viewport.rig().can_rotate());
        // off the diagonal shared by the plane's two triangles
        let hits = viewport.scene().get_intersects(
            viewport.rig(),
            300.0,
            250.0,
            crate::gfx::scene::PickTarget::Mesh,
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_pip_only_rendered_in_orthographic_mode() {
        let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
        viewport
            .set_asset(&Asset::mesh("ball", generate_sphere(16, 8)))
            .unwrap();
        viewport.hover(Some(Point2::new(100.0, 100.0)));
        assert!(viewport.render().pip.is_none());

        viewport.set_camera_mode(CameraMode::Orthographic);
        viewport.hover(Some(Point2::new(120.0, 100.0)));
        let frame = viewport.last_frame().unwrap();
        assert_eq!(frame.mode, CameraMode::Orthographic);
        assert!(frame.pip.is_some());
    }

    #[test]
    fn test_touch_and_tick() {
        let mut viewport = viewport();
        let mut group = group(vec![None]);
        let now = Instant::now();

        viewport.touch(&mut group, &TouchPoint::finger(1, TouchPhase::Started, 400.0, 300.0), now);
        viewport.touch(&mut group, &TouchPoint::finger(1, TouchPhase::Moved, 440.0, 300.0), now);
        viewport.touch(&mut group, &TouchPoint::finger(1, TouchPhase::Ended, 440.0, 300.0), now);

        let before = viewport.frames_rendered();
        let mut frames = 0;
        while viewport.tick() {
            frames += 1;
        }
        assert!(frames > 0);
        assert_eq!(viewport.frames_rendered(), before + frames);
    }
}
