//! # Octree
//!
//! A build-once spatial index over mesh triangles. Triangles are inserted by
//! bounding box into an [`OctreeBuilder`]; a leaf that grows past its capacity
//! splits into eight equal octants and pushes its items down. [`OctreeBuilder::finalize`]
//! then drops the per-item boxes and freezes the tree into an [`Octree`] that
//! only answers ray queries.
//!
//! ```rust
//! use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
//! use landmarker::gfx::geometry::generate_sphere;
//! use landmarker::gfx::picking::{Octree, Ray};
//!
//! let sphere = generate_sphere(32, 16);
//! let octree = Octree::for_geometry(&sphere, 75, 10);
//!
//! let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
//! let hits = octree.intersect_mesh(&ray, &sphere, &Matrix4::identity());
//! assert!((hits[0].distance - 4.0).abs() < 1e-2);
//! ```

use cgmath::{Matrix4, MetricSpace, SquareMatrix, Transform};

use super::{sort_by_distance, Aabb, HitTarget, Intersection, Ray};
use crate::gfx::geometry::GeometryData;

/// A node of the finished tree: either exactly eight children or a list of
/// triangle indices, never both.
#[derive(Debug, Clone)]
pub enum Node {
    Interior {
        bounds: Aabb,
        children: Box<[Node; 8]>,
    },
    Leaf {
        bounds: Aabb,
        items: Box<[u32]>,
    },
}

impl Node {
    pub fn bounds(&self) -> &Aabb {
        match self {
            Node::Interior { bounds, .. } | Node::Leaf { bounds, .. } => bounds,
        }
    }

    fn collect(&self, ray: &Ray, out: &mut Vec<u32>) {
        if self.bounds().intersect_ray(ray).is_none() {
            return;
        }
        match self {
            Node::Interior { children, .. } => {
                for child in children.iter() {
                    child.collect(ray, out);
                }
            }
            Node::Leaf { items, .. } => out.extend_from_slice(items),
        }
    }
}

/// Immutable triangle index produced by [`OctreeBuilder::finalize`].
#[derive(Debug, Clone)]
pub struct Octree {
    root: Node,
}

impl Octree {
    /// Index every triangle of `geometry`.
    pub fn for_geometry(geometry: &GeometryData, capacity: usize, max_depth: usize) -> Self {
        let mut builder = OctreeBuilder::new(geometry.bounding_box(), capacity, max_depth);
        for face in 0..geometry.triangle_count() {
            let [a, b, c] = geometry.triangle(face);
            builder.add(face as u32, Aabb::from_points([a, b, c]));
        }
        let octree = builder.finalize();
        log::debug!(
            "octree over {} triangles: {} leaves, depth {}",
            geometry.triangle_count(),
            octree.leaf_count(),
            octree.depth()
        );
        octree
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Items of every leaf whose box the ray touches, deduplicated and ascending.
    pub fn candidates(&self, ray: &Ray) -> Vec<u32> {
        let mut items = Vec::new();
        self.root.collect(ray, &mut items);
        items.sort_unstable();
        items.dedup();
        items
    }

    /// Intersect a world-space ray with the mesh this tree indexes.
    ///
    /// The ray is taken into mesh-local space with the inverse of
    /// `world_matrix`; only candidate triangles get the exact test. Hits are
    /// reported in world space, nearest first.
    pub fn intersect_mesh(
        &self,
        ray: &Ray,
        geometry: &GeometryData,
        world_matrix: &Matrix4<f64>,
    ) -> Vec<Intersection> {
        let Some(inverse) = world_matrix.invert() else {
            return Vec::new();
        };
        let local_ray = ray.transformed(&inverse);
        let faces = self.candidates(&local_ray);
        intersect_faces(
            ray,
            &local_ray,
            geometry,
            world_matrix,
            faces.into_iter().map(|f| f as usize),
        )
    }

    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Interior { children, .. } => children.iter().map(count).sum(),
                Node::Leaf { .. } => 1,
            }
        }
        count(&self.root)
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Interior { children, .. } => 1 + children.iter().map(depth).max().unwrap_or(0),
                Node::Leaf { .. } => 0,
            }
        }
        depth(&self.root)
    }
}

/// Exact test of `faces` against a mesh, without any spatial index.
///
/// `local_ray` is `world_ray` expressed in the mesh's local space.
pub fn intersect_faces(
    world_ray: &Ray,
    local_ray: &Ray,
    geometry: &GeometryData,
    world_matrix: &Matrix4<f64>,
    faces: impl IntoIterator<Item = usize>,
) -> Vec<Intersection> {
    let mut hits: Vec<Intersection> = faces
        .into_iter()
        .filter_map(|face| {
            let [a, b, c] = geometry.triangle(face);
            let t = local_ray.intersect_triangle(a, b, c)?;
            let point = world_matrix.transform_point(local_ray.point_at(t));
            Some(Intersection {
                distance: world_ray.origin.distance(point),
                point,
                target: HitTarget::Face(face),
            })
        })
        .collect();
    sort_by_distance(&mut hits);
    hits
}

/// Brute force counterpart of [`Octree::intersect_mesh`].
pub fn intersect_geometry(
    ray: &Ray,
    geometry: &GeometryData,
    world_matrix: &Matrix4<f64>,
) -> Vec<Intersection> {
    let Some(inverse) = world_matrix.invert() else {
        return Vec::new();
    };
    let local_ray = ray.transformed(&inverse);
    intersect_faces(ray, &local_ray, geometry, world_matrix, 0..geometry.triangle_count())
}

enum BuildContent {
    Leaf(Vec<(u32, Aabb)>),
    Interior(Box<[BuildNode; 8]>),
}

struct BuildNode {
    bounds: Aabb,
    depth: usize,
    content: BuildContent,
}

impl BuildNode {
    fn leaf(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            content: BuildContent::Leaf(Vec::new()),
        }
    }

    fn add(&mut self, item: u32, bounds: Aabb, capacity: usize, max_depth: usize) {
        match &mut self.content {
            BuildContent::Interior(children) => {
                for child in children.iter_mut() {
                    if child.bounds.intersects(&bounds) {
                        child.add(item, bounds, capacity, max_depth);
                    }
                }
            }
            BuildContent::Leaf(items) => {
                items.push((item, bounds));
                if items.len() > capacity && self.depth < max_depth {
                    self.subdivide(capacity, max_depth);
                }
            }
        }
    }

    fn subdivide(&mut self, capacity: usize, max_depth: usize) {
        let mut children: Box<[BuildNode; 8]> = Box::new(std::array::from_fn(|i| {
            BuildNode::leaf(self.bounds.octant(i), self.depth + 1)
        }));

        let previous = std::mem::replace(&mut self.content, BuildContent::Leaf(Vec::new()));
        if let BuildContent::Leaf(items) = previous {
            for (item, bounds) in items {
                for child in children.iter_mut() {
                    if child.bounds.intersects(&bounds) {
                        child.add(item, bounds, capacity, max_depth);
                    }
                }
            }
        }
        self.content = BuildContent::Interior(children);
    }

    fn finalize(self) -> Node {
        match self.content {
            BuildContent::Interior(children) => {
                let children: [BuildNode; 8] = *children;
                Node::Interior {
                    bounds: self.bounds,
                    children: Box::new(children.map(BuildNode::finalize)),
                }
            }
            BuildContent::Leaf(items) => Node::Leaf {
                bounds: self.bounds,
                items: items.into_iter().map(|(item, _)| item).collect(),
            },
        }
    }
}

/// Mutable octree under construction.
pub struct OctreeBuilder {
    root: BuildNode,
    capacity: usize,
    max_depth: usize,
}

impl OctreeBuilder {
    pub fn new(bounds: Aabb, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: BuildNode::leaf(bounds, 0),
            capacity: capacity.max(1),
            max_depth,
        }
    }

    /// Insert an item by its bounding box.
    pub fn add(&mut self, item: u32, bounds: Aabb) {
        self.root.add(item, bounds, self.capacity, self.max_depth);
    }

    /// Freeze the tree, discarding per-item boxes.
    pub fn finalize(self) -> Octree {
        Octree {
            root: self.root.finalize(),
        }
    }
}
