//! # Touch Gestures
//!
//! Finger input drives the camera by arity (one finger rotates or pans, two
//! pinch, three pan) unless a single finger lands on a landmark, in which
//! case it drags the selection like the mouse does.
//!
//! Stylus input never moves the camera. It snaps the nearest placed landmark
//! to the pen for the whole stroke, or fills the next available slot when
//! nothing is placed yet. Pen contacts shortly after a pinch are ignored, as
//! lifting two fingers tends to register as a stray pen tap.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use cgmath::{Point2, Point3};

use super::context::{InteractionContext, Pick};
use super::events::{TouchPhase, TouchPoint};
use super::listeners::Listener;

#[derive(Debug, Clone, PartialEq)]
struct FingerDrag {
    id: u64,
    last: Point2<f64>,
    origins: Vec<(usize, Option<Point3<f64>>)>,
    moved: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Stroke {
    id: u64,
    target: Option<usize>,
    origins: Vec<(usize, Option<Point3<f64>>)>,
}

#[derive(Debug, Default)]
pub struct TouchHandler {
    /// Active fingers by id
    fingers: BTreeMap<u64, Point2<f64>>,
    drag: Option<FingerDrag>,
    stroke: Option<Stroke>,
    pinching: bool,
    pinch_ended: Option<Instant>,
}

impl TouchHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finger_count(&self) -> usize {
        self.fingers.len()
    }

    pub fn is_dragging_landmark(&self) -> bool {
        self.drag.is_some()
    }

    /// Forget all contacts without touching landmarks.
    pub fn reset(&mut self) {
        self.fingers.clear();
        self.drag = None;
        self.stroke = None;
        self.pinching = false;
    }

    fn positions(&self) -> Vec<Point2<f64>> {
        self.fingers.values().copied().collect()
    }

    /// Handle one contact change observed at `now`. Returns true if the
    /// frame needs redrawing.
    pub fn on_touch(&mut self, ctx: &mut InteractionContext, touch: &TouchPoint, now: Instant) -> bool {
        if touch.stylus {
            return self.on_stylus(ctx, touch, now);
        }

        match touch.phase {
            TouchPhase::Started => {
                self.fingers.insert(touch.id, touch.position);
                if self.fingers.len() == 1 {
                    if let Pick::Landmark(index) = ctx.pick(touch.position) {
                        self.start_drag(ctx, touch, index);
                        return true;
                    }
                } else if self.drag.is_some() {
                    // a second finger turns the drag into a camera gesture
                    self.finish_drag(ctx);
                }
                if self.fingers.len() == 2 {
                    self.pinching = true;
                }
                let positions = self.positions();
                ctx.camera.on_touches(&positions, ctx.listeners)
            }
            TouchPhase::Moved => {
                let Some(finger) = self.fingers.get_mut(&touch.id) else {
                    return false;
                };
                *finger = touch.position;

                if let Some(drag) = self.drag.as_mut().filter(|drag| drag.id == touch.id) {
                    let delta = touch.position - drag.last;
                    drag.last = touch.position;
                    let changed = ctx.drag_selected(delta);
                    drag.moved |= changed;
                    return changed;
                }
                let positions = self.positions();
                ctx.camera.on_touches(&positions, ctx.listeners)
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.fingers.remove(&touch.id).is_none() {
                    return false;
                }
                if self.drag.as_ref().is_some_and(|drag| drag.id == touch.id) {
                    self.finish_drag(ctx);
                    return true;
                }
                if self.pinching && self.fingers.len() < 2 {
                    self.pinching = false;
                    self.pinch_ended = Some(now);
                    log::trace!("pinch ended");
                }
                let positions = self.positions();
                ctx.camera.on_touches(&positions, ctx.listeners);
                true
            }
        }
    }

    fn start_drag(&mut self, ctx: &mut InteractionContext, touch: &TouchPoint, index: usize) {
        let selected = ctx
            .callbacks
            .landmarks()
            .get(index)
            .is_some_and(|lm| lm.is_selected());
        if !selected {
            ctx.callbacks.select_landmark_and_deselect_rest(index);
        }
        ctx.camera.disable(ctx.listeners);
        ctx.listeners.attach(Listener::LandmarkDrag);
        log::debug!("touch {} pressed landmark {}", touch.id, index);

        self.drag = Some(FingerDrag {
            id: touch.id,
            last: touch.position,
            origins: ctx.selection_origins(),
            moved: false,
        });
    }

    fn finish_drag(&mut self, ctx: &mut InteractionContext) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        ctx.listeners.detach(Listener::LandmarkDrag);
        ctx.camera.enable();
        if drag.moved {
            ctx.callbacks.add_landmark_history(&drag.origins);
        }
    }

    fn in_pinch_debounce(&self, ctx: &InteractionContext, now: Instant) -> bool {
        if self.pinching {
            return true;
        }
        let debounce = Duration::from_millis(ctx.settings.stylus_pinch_debounce_ms);
        self.pinch_ended
            .is_some_and(|ended| now.saturating_duration_since(ended) < debounce)
    }

    fn on_stylus(&mut self, ctx: &mut InteractionContext, touch: &TouchPoint, now: Instant) -> bool {
        if touch.is_release() {
            if !self.stroke.as_ref().is_some_and(|stroke| stroke.id == touch.id) {
                return false;
            }
            let Some(stroke) = self.stroke.take() else {
                return false;
            };
            if !stroke.origins.is_empty() {
                ctx.callbacks.add_landmark_history(&stroke.origins);
            }
            return true;
        }

        if touch.phase == TouchPhase::Started {
            if self.in_pinch_debounce(ctx, now) {
                log::debug!("ignoring stylus contact right after a pinch");
                return false;
            }
            self.stroke = Some(Stroke {
                id: touch.id,
                target: None,
                origins: Vec::new(),
            });
        }
        let Some(stroke) = self.stroke.as_mut().filter(|stroke| stroke.id == touch.id) else {
            return false;
        };
        let Some(point) = ctx.surface_point(touch.position) else {
            return false;
        };

        if stroke.target.is_none() && touch.phase == TouchPhase::Started {
            match ctx.nearest_landmarks(point, 1).first() {
                Some(&index) => {
                    let origin = ctx.callbacks.landmarks()[index].point();
                    stroke.target = Some(index);
                    stroke.origins = vec![(index, origin)];
                    ctx.callbacks.select_landmark_and_deselect_rest(index);
                }
                None => {
                    ctx.callbacks.insert_new_landmark(point);
                    return true;
                }
            }
        }

        match stroke.target {
            Some(index) => {
                ctx.callbacks.set_landmark_point(index, point);
                true
            }
            None => false,
        }
    }
}
