use cgmath::{InnerSpace, Matrix4, MetricSpace, Point2, Point3, SquareMatrix, Transform as _};

use super::asset::Asset;
use super::object::{MeshObject, TransformChain};
use super::symbols::SymbolSet;
use crate::config::SceneSettings;
use crate::error::{Error, Result};
use crate::gfx::camera::{CameraMode, CameraRig};
use crate::gfx::picking::{sort_by_distance, HitTarget, Intersection, Ray};
use crate::gfx::rendering::{LandmarkInstance, LineInstance};
use crate::model::Landmark;

/// What a ray cast should test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Mesh,
    Landmarks,
}

/// Owns the mesh, the landmark symbols and the transforms placing them in
/// world space, and answers picking queries for the gesture handlers.
#[derive(Debug)]
pub struct SceneManager {
    settings: SceneSettings,
    mesh: Option<MeshObject>,
    chain: TransformChain,
    helper_chain: TransformChain,
    symbols: SymbolSet,
    /// Landmark sphere radius in mesh-local units
    symbol_radius: f64,
}

impl SceneManager {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            mesh: None,
            chain: TransformChain::default(),
            helper_chain: TransformChain::default(),
            symbols: SymbolSet::default(),
            symbol_radius: 0.0,
        }
    }

    /// Replace the mesh, normalizing it into the unit sphere and orienting it
    /// by the asset's up and front vectors.
    pub fn set_mesh(&mut self, asset: &Asset) -> Result<()> {
        if asset.geometry.triangle_count() == 0 {
            return Err(Error::EmptyGeometry);
        }

        let mesh = MeshObject::new(
            asset.geometry.clone(),
            self.settings.octree_leaf_capacity,
            self.settings.octree_max_depth,
        );
        let radius = mesh.bounding_sphere().radius;
        let scale = if radius > 0.0 { 1.0 / radius } else { 1.0 };

        self.chain.translate.set_translation(mesh.centering());
        self.chain
            .scale_rotate
            .set_scale_rotation(scale, asset.up, asset.front);
        self.helper_chain = self.chain;
        self.symbol_radius = radius * self.settings.landmark_scale;

        log::info!(
            "set mesh for '{}': {} triangles, octree with {} leaves",
            asset.id,
            mesh.geometry().triangle_count(),
            mesh.octree().leaf_count()
        );
        self.mesh = Some(mesh);
        Ok(())
    }

    pub fn clear_mesh(&mut self) {
        self.mesh = None;
        self.chain.reset();
        self.helper_chain.reset();
    }

    pub fn mesh(&self) -> Option<&MeshObject> {
        self.mesh.as_ref()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn symbol_radius(&self) -> f64 {
        self.symbol_radius
    }

    /// Dispose all landmark symbols and lines and rebuild them.
    pub fn set_landmarks_and_connectivity(
        &mut self,
        landmarks: &[Landmark],
        connectivity: &[[usize; 2]],
    ) {
        self.symbols.rebuild(landmarks, connectivity);
    }

    /// Patch only the symbols (and lines) whose landmark changed.
    pub fn update_landmarks(&mut self, landmarks: &[Landmark]) -> Vec<usize> {
        self.symbols.sync(landmarks)
    }

    pub fn world_matrix(&self) -> Matrix4<f64> {
        self.chain.world_matrix()
    }

    fn inverse_world_matrix(&self) -> Matrix4<f64> {
        self.world_matrix().invert().unwrap_or_else(Matrix4::identity)
    }

    pub fn world_to_local(&self, world: Point3<f64>) -> Point3<f64> {
        self.inverse_world_matrix().transform_point(world)
    }

    pub fn local_to_world(&self, local: Point3<f64>) -> Point3<f64> {
        self.world_matrix().transform_point(local)
    }

    pub fn local_to_screen(&self, rig: &CameraRig, local: Point3<f64>) -> Point2<f64> {
        rig.world_to_screen(self.local_to_world(local))
    }

    /// The world-space ray under a pixel for the rig's current mode.
    pub fn ray_at(&self, rig: &CameraRig, x: f64, y: f64) -> Ray {
        let ndc = rig.to_ndc(Point2::new(x, y));
        let camera = rig.active();
        match rig.mode() {
            CameraMode::Perspective => {
                let origin = camera.position();
                let through = camera.unproject(Point3::new(ndc.x, ndc.y, 0.5));
                Ray::new(origin, through - origin)
            }
            CameraMode::Orthographic => {
                let origin = camera.unproject(Point3::new(ndc.x, ndc.y, -1.0));
                Ray::new(origin, rig.pose().forward())
            }
        }
    }

    /// Everything under pixel `(x, y)`, nearest first. Missing targets give an
    /// empty list.
    pub fn get_intersects(
        &self,
        rig: &CameraRig,
        x: f64,
        y: f64,
        target: PickTarget,
    ) -> Vec<Intersection> {
        let ray = self.ray_at(rig, x, y);
        match target {
            PickTarget::Mesh => match &self.mesh {
                Some(mesh) => {
                    mesh.octree()
                        .intersect_mesh(&ray, mesh.geometry(), &self.world_matrix())
                }
                None => Vec::new(),
            },
            PickTarget::Landmarks => self.intersect_symbols(&ray),
        }
    }

    fn intersect_symbols(&self, ray: &Ray) -> Vec<Intersection> {
        let world = self.world_matrix();
        let local_ray = ray.transformed(&self.inverse_world_matrix());

        let mut hits: Vec<Intersection> = self
            .symbols
            .symbols()
            .filter_map(|symbol| {
                let t = local_ray.intersect_sphere(symbol.center, self.symbol_radius)?;
                let point = world.transform_point(local_ray.point_at(t));
                Some(Intersection {
                    distance: ray.origin.distance(point),
                    point,
                    target: HitTarget::Landmark(symbol.index),
                })
            })
            .collect();
        sort_by_distance(&mut hits);
        hits
    }

    /// Whether a landmark symbol can be seen at its own screen position, i.e.
    /// the mesh does not hide it.
    pub fn lm_view_visible(&self, rig: &CameraRig, index: usize) -> bool {
        let Some(symbol) = self.symbols.symbol(index) else {
            return false;
        };
        let screen = self.local_to_screen(rig, symbol.center);

        let mesh_hit = self
            .get_intersects(rig, screen.x, screen.y, PickTarget::Mesh)
            .first()
            .map(|hit| hit.distance);
        let Some(mesh_distance) = mesh_hit else {
            return true;
        };

        self.get_intersects(rig, screen.x, screen.y, PickTarget::Landmarks)
            .iter()
            .find(|hit| hit.landmark() == Some(index))
            .is_some_and(|hit| hit.distance <= mesh_distance)
    }

    /// Visible landmarks whose screen projection falls inside the rectangle
    /// spanned by two corners.
    pub fn lm_views_in_selection_box(
        &self,
        rig: &CameraRig,
        a: Point2<f64>,
        b: Point2<f64>,
    ) -> Vec<usize> {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));

        self.symbols
            .symbols()
            .filter(|symbol| {
                let s = self.local_to_screen(rig, symbol.center);
                s.x >= min_x && s.x <= max_x && s.y >= min_y && s.y <= max_y
            })
            .map(|symbol| symbol.index)
            .filter(|&index| self.lm_view_visible(rig, index))
            .collect()
    }

    /// World-space landmark spheres for the renderer.
    pub fn landmark_instances(&self) -> Vec<LandmarkInstance> {
        let world = self.world_matrix();
        let radius = self.world_symbol_radius();
        self.symbols
            .symbols()
            .map(|symbol| {
                LandmarkInstance::new(world.transform_point(symbol.center), radius, symbol.selected)
            })
            .collect()
    }

    /// World-space connectivity segments, placed through the helper chain.
    pub fn line_instances(&self) -> Vec<LineInstance> {
        let helper = self.helper_chain.world_matrix();
        self.symbols
            .lines()
            .map(|line| {
                LineInstance::new(
                    helper.transform_point(line.start),
                    helper.transform_point(line.end),
                )
            })
            .collect()
    }

    fn world_symbol_radius(&self) -> f64 {
        let world = self.world_matrix();
        self.symbol_radius * world.x.truncate().magnitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::gfx::geometry::{generate_plane, generate_sphere};
    use crate::model::{GroupKey, LandmarkGroup, LandmarkTracker};
    use crate::interaction::ViewportCallbacks;

    fn rig() -> CameraRig {
        CameraRig::new(800.0, 600.0, CameraSettings::default())
    }

    fn sphere_scene() -> SceneManager {
        let mut scene = SceneManager::new(SceneSettings::default());
        let mut geometry = generate_sphere(48, 24);
        for v in &mut geometry.vertices {
            // radius 10, centered at (5, 0, 0)
            *v = [v[0] * 10.0 + 5.0, v[1] * 10.0, v[2] * 10.0];
        }
        scene.set_mesh(&Asset::mesh("ball", geometry)).unwrap();
        scene
    }

    #[test]
    fn test_set_mesh_normalizes_into_unit_sphere() {
        let scene = sphere_scene();
        let center = scene.local_to_world(Point3::new(5.0, 0.0, 0.0));
        assert!(center.distance(Point3::new(0.0, 0.0, 0.0)) < 1e-6);

        let surface = scene.local_to_world(Point3::new(5.0, 0.0, 10.0));
        assert!((surface.distance(Point3::new(0.0, 0.0, 0.0)) - 1.0).abs() < 1e-3);

        let back = scene.world_to_local(surface);
        assert!(back.distance(Point3::new(5.0, 0.0, 10.0)) < 1e-9);
    }

    #[test]
    fn test_empty_geometry_is_rejected() {
        let mut scene = SceneManager::new(SceneSettings::default());
        let asset = Asset::mesh("nothing", Default::default());
        assert!(matches!(scene.set_mesh(&asset), Err(Error::EmptyGeometry)));
        assert!(!scene.has_mesh());
    }

    #[test]
    fn test_center_ray_hits_front_of_mesh_in_both_modes() {
        let scene = sphere_scene();
        let mut rig = rig();

        let hits = scene.get_intersects(&rig, 400.0, 300.0, PickTarget::Mesh);
        assert!(!hits.is_empty());
        assert!(hits[0].point.z > 0.95);
        assert!((hits[0].distance - 1.5).abs() < 0.05);

        rig.set_mode(CameraMode::Orthographic);
        let hits = scene.get_intersects(&rig, 400.0, 300.0, PickTarget::Mesh);
        assert!(hits[0].point.z > 0.95);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_missing_targets_return_empty() {
        let scene = SceneManager::new(SceneSettings::default());
        let rig = rig();
        assert!(scene
            .get_intersects(&rig, 400.0, 300.0, PickTarget::Mesh)
            .is_empty());
        assert!(scene
            .get_intersects(&rig, 400.0, 300.0, PickTarget::Landmarks)
            .is_empty());

        let scene = sphere_scene();
        assert!(scene
            .get_intersects(&rig, 1.0, 1.0, PickTarget::Mesh)
            .is_empty());
    }

    #[test]
    fn test_landmark_picking_and_occlusion() {
        let mut scene = sphere_scene();
        let rig = rig();

        // one landmark on the near pole, one on the far pole
        let group = LandmarkGroup::new(
            GroupKey::new("ball", "t"),
            vec![
                Some(Point3::new(5.0, 0.0, 10.0)),
                Some(Point3::new(5.0, 0.0, -10.0)),
            ],
            3,
            vec![[0, 1]],
            Vec::new(),
            LandmarkTracker::default(),
        )
        .unwrap();
        scene.set_landmarks_and_connectivity(group.landmarks(), group.connectivity());

        let hits = scene.get_intersects(&rig, 400.0, 300.0, PickTarget::Landmarks);
        assert_eq!(hits.first().and_then(Intersection::landmark), Some(0));

        assert!(scene.lm_view_visible(&rig, 0));
        assert!(!scene.lm_view_visible(&rig, 1));

        let everything = scene.lm_views_in_selection_box(
            &rig,
            Point2::new(0.0, 0.0),
            Point2::new(800.0, 600.0),
        );
        assert_eq!(everything, vec![0]);

        let nowhere =
            scene.lm_views_in_selection_box(&rig, Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
        assert!(nowhere.is_empty());
    }

    #[test]
    fn test_instances_are_in_world_space() {
        let mut scene = SceneManager::new(SceneSettings::default());
        scene
            .set_mesh(&Asset::mesh("plane", generate_plane(4.0, 4.0, 2, 2)))
            .unwrap();
        let mut group = LandmarkGroup::new(
            GroupKey::new("plane", "t"),
            vec![Some(Point3::new(2.0, 2.0, 0.0)), None],
            3,
            vec![[0, 1]],
            Vec::new(),
            LandmarkTracker::default(),
        )
        .unwrap();
        scene.set_landmarks_and_connectivity(group.landmarks(), group.connectivity());

        let instances = scene.landmark_instances();
        assert_eq!(instances.len(), 1);
        // the world radius is a fixed fraction of the unit bounding sphere
        assert!((instances[0].radius as f64 - 0.01).abs() < 1e-6);
        let expected = 2.0 / 8f64.sqrt();
        assert!((instances[0].position[0] as f64 - expected).abs() < 1e-6);
        assert!(scene.line_instances().is_empty());

        group.set_landmark_point(1, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(scene.update_landmarks(group.landmarks()), vec![1]);
        let lines = scene.line_instances();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].end[0] as f64 + 2.0 / 8f64.sqrt()).abs() < 1e-6);
    }
}
