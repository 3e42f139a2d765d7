use cgmath::{MetricSpace, Point2, Point3, Vector2, Zero};

use super::callbacks::ViewportCallbacks;
use super::listeners::DocumentListeners;
use crate::config::InteractionSettings;
use crate::gfx::camera::CameraController;
use crate::gfx::rendering::Overlay;
use crate::gfx::scene::{PickTarget, SceneManager};

/// Everything a gesture handler touches while resolving one event.
pub struct InteractionContext<'a> {
    pub scene: &'a SceneManager,
    pub camera: &'a mut CameraController,
    pub listeners: &'a mut DocumentListeners,
    pub overlay: &'a mut Overlay,
    pub callbacks: &'a mut dyn ViewportCallbacks,
    pub settings: &'a InteractionSettings,
    /// Snap editing mode
    pub editing: bool,
}

/// What lies under a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pick {
    Landmark(usize),
    /// Mesh-local surface point
    Mesh(Point3<f64>),
    Nothing,
}

impl InteractionContext<'_> {
    /// The nearest thing under `position`. A landmark wins over the mesh when
    /// it is at least as close.
    pub fn pick(&self, position: Point2<f64>) -> Pick {
        let rig = self.camera.rig();
        let landmark = self
            .scene
            .get_intersects(rig, position.x, position.y, PickTarget::Landmarks)
            .into_iter()
            .next();
        let mesh = self
            .scene
            .get_intersects(rig, position.x, position.y, PickTarget::Mesh)
            .into_iter()
            .next();

        match (landmark, mesh) {
            (Some(lm), Some(surface)) if lm.distance <= surface.distance => {
                lm.landmark().map_or(Pick::Nothing, Pick::Landmark)
            }
            (Some(lm), None) => lm.landmark().map_or(Pick::Nothing, Pick::Landmark),
            (_, Some(surface)) => Pick::Mesh(self.scene.world_to_local(surface.point)),
            (None, None) => Pick::Nothing,
        }
    }

    /// The mesh-local surface point under `position`, if any.
    pub fn surface_point(&self, position: Point2<f64>) -> Option<Point3<f64>> {
        let hit = self
            .scene
            .get_intersects(self.camera.rig(), position.x, position.y, PickTarget::Mesh)
            .into_iter()
            .next()?;
        Some(self.scene.world_to_local(hit.point))
    }

    pub fn to_screen(&self, local: Point3<f64>) -> Point2<f64> {
        self.scene.local_to_screen(self.camera.rig(), local)
    }

    /// Selected landmarks with their current points, as drag origins.
    pub fn selection_origins(&self) -> Vec<(usize, Option<Point3<f64>>)> {
        self.callbacks
            .landmarks()
            .iter()
            .filter(|lm| lm.is_selected())
            .map(|lm| (lm.index(), lm.point()))
            .collect()
    }

    /// Move every selected landmark by a screen delta, re-projecting each
    /// onto the mesh. A landmark whose new screen position misses the mesh
    /// stays where it is. Returns true if anything moved.
    pub fn drag_selected(&mut self, delta: Vector2<f64>) -> bool {
        if delta.is_zero() {
            return false;
        }
        let moving: Vec<(usize, Point3<f64>)> = self
            .callbacks
            .landmarks()
            .iter()
            .filter(|lm| lm.is_selected())
            .filter_map(|lm| Some((lm.index(), lm.point()?)))
            .collect();

        let mut moved = false;
        for (index, point) in moving {
            let screen = self.to_screen(point) + delta;
            match self.surface_point(screen) {
                Some(local) => {
                    self.callbacks.set_landmark_point(index, local);
                    moved = true;
                }
                None => log::debug!("landmark {} fell off the mesh, skipping", index),
            }
        }
        moved
    }

    /// Up to `count` placed landmarks nearest to a mesh-local point, nearest
    /// first.
    pub fn nearest_landmarks(&self, point: Point3<f64>, count: usize) -> Vec<usize> {
        let mut candidates: Vec<(usize, f64)> = self
            .callbacks
            .landmarks()
            .iter()
            .filter_map(|lm| Some((lm.index(), lm.point()?.distance2(point))))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.truncate(count);
        candidates.into_iter().map(|(index, _)| index).collect()
    }
}
