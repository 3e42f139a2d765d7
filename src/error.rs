//! # Error Types
//!
//! Failures surfaced by the landmark engine. Ray casts and gesture steps never
//! fail: a miss is an empty result. Errors are reserved for malformed documents,
//! asset loading, and the backend boundary.

use thiserror::Error;

/// Errors produced while building landmark state or talking to the backend.
#[derive(Debug, Error)]
pub enum Error {
    /// A connectivity pair references a landmark index outside the group.
    #[error("connectivity pair {pair:?} references landmark {index}, but the group has {len} landmarks")]
    ConnectivityOutOfRange {
        pair: [usize; 2],
        index: usize,
        len: usize,
    },

    /// A label mask references a landmark index outside the group.
    #[error("label '{label}' references landmark {index}, but the group has {len} landmarks")]
    LabelOutOfRange {
        label: String,
        index: usize,
        len: usize,
    },

    /// A point is neither null, `[x, y]` nor `[x, y, z]`.
    #[error("landmark {index} has {dims} coordinates, expected 2 or 3")]
    InvalidPoint { index: usize, dims: usize },

    /// A document mixes 2D and 3D points.
    #[error("landmark document mixes 2D and 3D points")]
    MixedDimensions,

    /// Geometry without triangles cannot be normalized or indexed.
    #[error("geometry has no triangles")]
    EmptyGeometry,

    #[error("invalid landmark JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    /// A response arrived for an asset that is no longer the active request.
    #[error("response for asset '{asset}' was superseded by a newer request")]
    Superseded { asset: String },

    /// The backend service reported a failure.
    #[error("backend request failed: {0}")]
    Backend(#[source] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
