//! # Landmark Model
//!
//! Landmark groups, their persisted document form, and the undo/redo tracker.
//!
//! - [`LandmarkGroup`] - landmarks, connectivity and labels for one asset and template
//! - [`LandmarkDocument`] - the JSON shape loaded from and saved to the backend
//! - [`Tracker`] - generic two-tier (operations plus checkpoints) history
//! - [`Listeners`] - typed change notification registry

pub mod document;
pub mod group;
pub mod label;
pub mod landmark;
pub mod listeners;
pub mod tracker;

pub use document::{Coord, LabelEntry, LandmarkDocument, LandmarksSection, DOCUMENT_VERSION};
pub use group::{
    GroupEvent, GroupKey, LandmarkGroup, LandmarkTracker, ParsedDocument, PointMove, Snapshot,
};
pub use label::Label;
pub use landmark::Landmark;
pub use listeners::{ListenerId, Listeners};
pub use tracker::{History, Tracker, TrackerChange};
