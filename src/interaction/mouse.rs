//! # Mouse Gestures
//!
//! Resolves press, move and release sequences into landmark intents:
//!
//! - **Landmark press**: select on press, drag the selection across the mesh,
//!   and on release either toggle the selection (click) or record one history
//!   step for the whole drag
//! - **Shift press**: rubber-band selection of visible landmarks
//! - **Mesh press**: the camera drags as usual; a click fills the next
//!   available slot, or in editing mode moves the snap target to the click
//! - **Nothing press**: the camera drags; a click clears the selection
//!
//! With no button down and editing enabled, hovering the mesh snaps the
//! selection to the nearest placed landmark and draws guide lines to the
//! closest candidates.

use cgmath::{Point2, Point3};

use super::context::{InteractionContext, Pick};
use super::events::{is_click, MouseButton, PointerEvent};
use super::listeners::Listener;

#[derive(Debug, Clone, Default, PartialEq)]
enum Press {
    #[default]
    None,
    /// A non-primary button, or a primary press the camera owns outright
    Camera,
    Landmark {
        index: usize,
        down: Point2<f64>,
        last: Point2<f64>,
        ctrl: bool,
        was_selected: bool,
        origins: Vec<(usize, Option<Point3<f64>>)>,
        moved: bool,
    },
    Shift {
        down: Point2<f64>,
    },
    Mesh {
        down: Point2<f64>,
        point: Point3<f64>,
    },
    Nothing {
        down: Point2<f64>,
    },
}

/// Snap targeting state while hovering in editing mode.
#[derive(Debug, Clone, Default, PartialEq)]
struct Snap {
    target: Option<usize>,
    candidates: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct MouseHandler {
    press: Press,
    /// Button that started `press`
    button: Option<MouseButton>,
    snap: Snap,
}

impl MouseHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press is being tracked.
    pub fn is_pressed(&self) -> bool {
        self.press != Press::None
    }

    pub fn is_dragging_landmark(&self) -> bool {
        matches!(self.press, Press::Landmark { .. })
    }

    /// The landmark the hover snap currently targets.
    pub fn snap_target(&self) -> Option<usize> {
        self.snap.target
    }

    /// Forget any press and snap state without touching landmarks.
    pub fn reset(&mut self) {
        self.press = Press::None;
        self.button = None;
        self.snap = Snap::default();
    }

    /// Returns true if the frame needs redrawing. Presses of other buttons
    /// are ignored until the current press is released.
    pub fn on_mouse_down(&mut self, ctx: &mut InteractionContext, event: &PointerEvent) -> bool {
        if self.press != Press::None {
            log::trace!("ignoring {:?} press during another press", event.button);
            return false;
        }
        let position = event.position;
        self.button = Some(event.button);
        ctx.overlay.guides.clear();

        if event.button != MouseButton::Left {
            self.press = Press::Camera;
            return ctx
                .camera
                .on_mouse_down(event.button, position, ctx.listeners);
        }

        if event.shift() {
            log::trace!("selection box started at {:?}", position);
            self.press = Press::Shift { down: position };
            ctx.overlay.selection_box = Some([position, position]);
            ctx.listeners.attach(Listener::ShiftDrag);
            return true;
        }

        match ctx.pick(position) {
            Pick::Landmark(index) => {
                let ctrl = event.ctrl_or_cmd();
                let was_selected = ctx
                    .callbacks
                    .landmarks()
                    .get(index)
                    .is_some_and(|lm| lm.is_selected());
                if !was_selected {
                    if ctrl {
                        ctx.callbacks.select_landmarks(&[index]);
                    } else {
                        ctx.callbacks.select_landmark_and_deselect_rest(index);
                    }
                }
                ctx.camera.disable(ctx.listeners);
                ctx.listeners.attach(Listener::LandmarkDrag);
                log::debug!("pressed landmark {}", index);

                self.press = Press::Landmark {
                    index,
                    down: position,
                    last: position,
                    ctrl,
                    was_selected,
                    origins: ctx.selection_origins(),
                    moved: false,
                };
            }
            Pick::Mesh(point) => {
                ctx.camera
                    .on_mouse_down(event.button, position, ctx.listeners);
                ctx.listeners.attach(Listener::MeshPress);
                self.press = Press::Mesh {
                    down: position,
                    point,
                };
            }
            Pick::Nothing => {
                ctx.camera
                    .on_mouse_down(event.button, position, ctx.listeners);
                ctx.listeners.attach(Listener::NothingPress);
                self.press = Press::Nothing { down: position };
            }
        }
        true
    }

    /// Returns true if the frame needs redrawing.
    pub fn on_mouse_move(&mut self, ctx: &mut InteractionContext, event: &PointerEvent) -> bool {
        if self.press == Press::None {
            return self.hover(ctx, event);
        }
        let position = event.position;
        match &mut self.press {
            Press::Landmark { last, moved, .. } => {
                if !ctx.listeners.is_attached(Listener::LandmarkDrag) {
                    return false;
                }
                let delta = position - *last;
                *last = position;
                let changed = ctx.drag_selected(delta);
                *moved |= changed;
                changed
            }
            Press::Shift { down } => {
                if !ctx.listeners.is_attached(Listener::ShiftDrag) {
                    return false;
                }
                ctx.overlay.selection_box = Some([*down, position]);
                true
            }
            Press::Camera | Press::Mesh { .. } | Press::Nothing { .. } => {
                ctx.camera.on_mouse_move(position, ctx.listeners)
            }
            Press::None => false,
        }
    }

    /// Returns true if the frame needs redrawing.
    pub fn on_mouse_up(&mut self, ctx: &mut InteractionContext, event: &PointerEvent) -> bool {
        if self.button.is_some_and(|button| button != event.button) {
            return false;
        }
        self.button = None;
        let position = event.position;
        let tolerance = ctx.settings.click_tolerance;

        match std::mem::take(&mut self.press) {
            Press::None => return false,
            Press::Camera => ctx.camera.on_mouse_up(ctx.listeners),
            Press::Landmark {
                index,
                down,
                ctrl,
                was_selected,
                origins,
                moved,
                ..
            } => {
                ctx.listeners.detach(Listener::LandmarkDrag);
                ctx.camera.enable();

                if moved {
                    ctx.callbacks.add_landmark_history(&origins);
                } else if is_click(down, position, tolerance) && was_selected {
                    if ctrl {
                        ctx.callbacks.deselect_landmarks(&[index]);
                    } else {
                        ctx.callbacks.select_landmark_and_deselect_rest(index);
                    }
                }
            }
            Press::Shift { down } => {
                ctx.listeners.detach(Listener::ShiftDrag);
                ctx.overlay.selection_box = None;
                let inside =
                    ctx.scene
                        .lm_views_in_selection_box(ctx.camera.rig(), down, position);
                log::debug!("selection box picked {:?}", inside);
                if !inside.is_empty() {
                    ctx.callbacks.select_landmarks(&inside);
                }
            }
            Press::Mesh { down, point } => {
                ctx.camera.on_mouse_up(ctx.listeners);
                ctx.listeners.detach(Listener::MeshPress);
                if is_click(down, position, tolerance) {
                    Self::mesh_click(ctx, point);
                }
            }
            Press::Nothing { down } => {
                ctx.camera.on_mouse_up(ctx.listeners);
                ctx.listeners.detach(Listener::NothingPress);
                if is_click(down, position, tolerance) {
                    ctx.callbacks.deselect_all_landmarks();
                }
            }
        }
        true
    }

    fn mesh_click(ctx: &mut InteractionContext, point: Point3<f64>) {
        if ctx.callbacks.next_available().is_some() {
            ctx.callbacks.insert_new_landmark(point);
        } else if ctx.editing {
            let selected = ctx.callbacks.selected_indices();
            if let [index] = selected[..] {
                ctx.callbacks.set_landmark_point_with_history(index, point);
            }
        }
    }

    fn hover(&mut self, ctx: &mut InteractionContext, event: &PointerEvent) -> bool {
        let had_guides = !ctx.overlay.guides.is_empty();
        ctx.overlay.guides.clear();

        if !ctx.editing || ctx.callbacks.selected_indices().len() > 1 {
            self.snap = Snap::default();
            return had_guides;
        }
        let Some(surface) = ctx.surface_point(event.position) else {
            self.snap.candidates.clear();
            return had_guides;
        };

        let count = ctx.settings.snap_candidates.max(1);
        let locked = self.snap.target.filter(|&index| {
            event.ctrl_or_cmd()
                && ctx
                    .callbacks
                    .landmarks()
                    .get(index)
                    .is_some_and(|lm| !lm.is_empty())
        });
        let mut candidates = ctx.nearest_landmarks(surface, count);
        if let Some(index) = locked {
            candidates.retain(|&other| other != index);
            candidates.insert(0, index);
            candidates.truncate(count);
        }

        let target = candidates.first().copied();
        if target != self.snap.target {
            if let Some(index) = target {
                log::trace!("snap target is now {}", index);
                ctx.callbacks.select_landmark_and_deselect_rest(index);
            }
            self.snap.target = target;
        }

        for &index in &candidates {
            if let Some(point) = ctx.callbacks.landmarks()[index].point() {
                let screen = ctx.to_screen(point);
                ctx.overlay.guides.push([event.position, screen]);
            }
        }
        self.snap.candidates = candidates;
        true
    }
}
