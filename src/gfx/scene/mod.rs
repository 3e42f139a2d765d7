//! # Scene Management Module
//!
//! The annotated mesh, its landmark symbols and connectivity lines, and the
//! transforms that normalize them into the unit sphere.
//!
//! ## Key Components
//!
//! - [`SceneManager`] - owns the mesh and symbols, answers ray casts
//! - [`Asset`] - geometry plus up/front orientation, mesh or image
//! - [`SymbolSet`] - per-landmark symbols with a create/update/dispose lifecycle
//! - [`Vertex3D`] - GPU vertex layout for the mesh
//!
//! ## Usage
//!
//! ```rust
//! use landmarker::config::{CameraSettings, SceneSettings};
//! use landmarker::gfx::camera::CameraRig;
//! use landmarker::gfx::geometry::generate_sphere;
//! use landmarker::gfx::scene::{Asset, PickTarget, SceneManager};
//!
//! let mut scene = SceneManager::new(SceneSettings::default());
//! scene.set_mesh(&Asset::mesh("ball", generate_sphere(32, 16))).unwrap();
//!
//! let rig = CameraRig::new(640.0, 480.0, CameraSettings::default());
//! let hits = scene.get_intersects(&rig, 320.0, 240.0, PickTarget::Mesh);
//! assert!(!hits.is_empty());
//! ```

pub mod asset;
pub mod object;
pub mod scene;
pub mod symbols;
pub mod vertex;

// Re-export main types
pub use asset::{Asset, AssetKind};
pub use object::{MeshObject, Transform, TransformChain};
pub use scene::{PickTarget, SceneManager};
pub use symbols::{ConnectionLine, LandmarkSymbol, SymbolSet};
pub use vertex::Vertex3D;
