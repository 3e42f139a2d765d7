//! # Ray Picking
//!
//! Ray casting primitives used to resolve pointer positions into mesh surface
//! points and landmark symbols.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: the scene converts a screen position into a world-space
//!    ray appropriate for the active camera (see [`crate::gfx::scene::SceneManager`])
//! 2. **Broad phase**: an [`Octree`] over the mesh triangles discards every
//!    triangle whose bounding box the ray cannot touch
//! 3. **Narrow phase**: exact ray-triangle (or ray-sphere for landmark symbols)
//!    tests, sorted by distance
//!
//! A miss is always an empty list, never an error.

pub mod octree;

pub use octree::{Octree, OctreeBuilder};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Transform, Vector3};

/// Rays shorter than this are degenerate hits.
const EPSILON: f64 = 1e-10;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Point3<f64>,
    /// Ray direction (normalized)
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// The same ray expressed in the space `matrix` maps into.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Self {
        let origin = matrix.transform_point(self.origin);
        let direction = matrix.transform_vector(self.direction);
        Self::new(origin, direction)
    }

    /// Möller–Trumbore ray/triangle test, double sided.
    ///
    /// Returns the ray parameter of the hit.
    pub fn intersect_triangle(&self, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<f64> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }

    /// Nearest non-negative ray parameter hitting a sphere.
    pub fn intersect_sphere(&self, center: Point3<f64>, radius: f64) -> Option<f64> {
        let to_center = center - self.origin;
        let along = to_center.dot(self.direction);
        let d2 = to_center.magnitude2() - along * along;
        let r2 = radius * radius;
        if d2 > r2 {
            return None;
        }

        let half_chord = (r2 - d2).sqrt();
        let near = along - half_chord;
        let far = along + half_chord;
        if far < 0.0 {
            None
        } else if near < 0.0 {
            Some(far)
        } else {
            Some(near)
        }
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Point3<f64>,
    /// Maximum corner of the bounding box
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// A box containing nothing; expanding it by a point yields that point.
    pub fn empty() -> Self {
        Self::new(
            Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn from_points(points: impl IntoIterator<Item = Point3<f64>>) -> Self {
        points.into_iter().fold(Self::empty(), |mut aabb, p| {
            aabb.expand_to(p);
            aabb
        })
    }

    pub fn expand_to(&mut self, p: Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn center(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Touching boxes intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y
            || other.max.z < self.min.z
            || other.min.z > self.max.z)
    }

    /// One of the eight equal sub-boxes. Bit 0 selects the upper x half,
    /// bit 1 upper y, bit 2 upper z.
    pub fn octant(&self, index: usize) -> Aabb {
        let mid = self.center();
        let pick = |bit: usize, lo: f64, m: f64, hi: f64| {
            if index & bit == 0 {
                (lo, m)
            } else {
                (m, hi)
            }
        };
        let (x0, x1) = pick(1, self.min.x, mid.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, mid.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, mid.z, self.max.z);
        Aabb::new(Point3::new(x0, y0, z0), Point3::new(x1, y1, z1))
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if direction.abs() < EPSILON {
                // Parallel to this slab: inside it or never
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let t0 = (lo - origin) / direction;
            let t1 = (hi - origin) / direction;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f64>) -> Self {
        let corners = (0..8).map(|i| {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point(corner)
        });
        Self::from_points(corners)
    }
}

/// What a ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A mesh triangle, by triangle index.
    Face(usize),
    /// A landmark symbol, by landmark index.
    Landmark(usize),
}

/// A single ray hit in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// World-space distance from the ray origin
    pub distance: f64,
    /// World-space hit point
    pub point: Point3<f64>,
    pub target: HitTarget,
}

impl Intersection {
    pub fn landmark(&self) -> Option<usize> {
        match self.target {
            HitTarget::Landmark(index) => Some(index),
            HitTarget::Face(_) => None,
        }
    }
}

/// Sort hits nearest first.
pub fn sort_by_distance(hits: &mut [Intersection]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_creation() {
        let aabb = Aabb::from_points([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, -1.0, -1.0),
        ]);

        assert_eq!(aabb.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Point3::new(1.0, 1.0, 1.0));
        assert!(Aabb::from_points([]).is_empty());
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));

        // Ray hitting the box
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        // Ray missing the box
        let ray_miss = Ray::new(Point3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());

        // Ray pointing away
        let ray_away = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(aabb.intersect_ray(&ray_away).is_none());
    }

    #[test]
    fn test_octants_tile_the_box() {
        let aabb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        assert_eq!(
            aabb.octant(0),
            Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
        );
        assert_eq!(
            aabb.octant(7),
            Aabb::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0))
        );
        assert_eq!(aabb.octant(1).min, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(aabb.octant(6).min, Point3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_triangle() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 3.0), Vector3::new(0.0, 0.0, -1.0));
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let t = ray.intersect_triangle(a, b, c).unwrap();
        assert!((t - 3.0).abs() < 1e-12);

        // Back faces count too
        assert!(ray.intersect_triangle(a, c, b).is_some());

        let outside = Ray::new(Point3::new(0.9, 0.9, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(outside.intersect_triangle(a, b, c).is_none());
    }

    #[test]
    fn test_ray_sphere() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let t = ray.intersect_sphere(Point3::new(0.0, 0.0, 0.0), 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-12);

        // From inside the sphere the far wall is hit
        let inside = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let t = inside.intersect_sphere(Point3::new(0.0, 0.0, 0.0), 2.0).unwrap();
        assert!((t - 2.0).abs() < 1e-12);

        assert!(ray.intersect_sphere(Point3::new(3.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_transformed_ray() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -2.0));
        let moved = ray.transformed(&Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(moved.origin, Point3::new(1.0, 2.0, 13.0));
        assert_eq!(moved.direction, Vector3::new(0.0, 0.0, -1.0));
    }
}
