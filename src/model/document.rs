//! Persisted landmark group JSON.
//!
//! ```json
//! { "landmarks": { "points": [[0.1, 0.2, 0.3], null], "connectivity": [[0, 1]] },
//!   "labels": [{ "label": "nose", "mask": [0, 1] }],
//!   "version": 2 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Version written by [`LandmarkGroup::to_document`](super::LandmarkGroup::to_document).
pub const DOCUMENT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LandmarkDocument {
    pub landmarks: LandmarksSection,
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub version: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LandmarksSection {
    /// `null`, `[x, y]` or `[x, y, z]` per landmark
    pub points: Vec<Option<Vec<Coord>>>,
    #[serde(default)]
    pub connectivity: Vec<[usize; 2]>,
}

impl LandmarksSection {
    /// Every point's coordinates as plain floats.
    pub fn coordinates(&self) -> Vec<Option<Vec<f64>>> {
        self.points
            .iter()
            .map(|point| point.as_ref().map(|coords| coords.iter().map(|c| c.value()).collect()))
            .collect()
    }
}

/// One coordinate, remembering whether it was written as an integer so that
/// `12` is not re-serialized as `12.0`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum Coord {
    Int(i64),
    Float(f64),
}

impl Coord {
    pub fn value(self) -> f64 {
        match self {
            Coord::Int(v) => v as f64,
            Coord::Float(v) => v,
        }
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Coord::Float(value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub label: String,
    pub mask: Vec<usize>,
}

impl LandmarkDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// A document of `count` empty landmarks with no connectivity or labels.
    pub fn empty(count: usize) -> Self {
        Self {
            landmarks: LandmarksSection {
                points: vec![None; count],
                connectivity: Vec::new(),
            },
            labels: Vec::new(),
            version: DOCUMENT_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mixed_nulls() {
        let doc = LandmarkDocument::from_json_str(
            r#"{"landmarks":{"points":[null,[1.5,2.5]],"connectivity":[[0,1]]},
                "labels":[{"label":"all","mask":[0,1]}],"version":2}"#,
        )
        .unwrap();
        assert_eq!(doc.landmarks.coordinates(), vec![None, Some(vec![1.5, 2.5])]);
        assert_eq!(doc.landmarks.connectivity, vec![[0, 1]]);
        assert_eq!(doc.labels[0].label, "all");
    }

    #[test]
    fn test_integer_coordinates_keep_their_form() {
        let value = json!({ "landmarks": { "points": [[12, 40], [12.0, 0.5], null] } });
        let doc = LandmarkDocument::from_value(value).unwrap();
        assert_eq!(
            doc.landmarks.points[0],
            Some(vec![Coord::Int(12), Coord::Int(40)])
        );
        assert_eq!(
            doc.landmarks.points[1],
            Some(vec![Coord::Float(12.0), Coord::Float(0.5)])
        );
        assert_eq!(
            doc.to_value().unwrap()["landmarks"]["points"],
            json!([[12, 40], [12.0, 0.5], null])
        );
    }

    #[test]
    fn test_missing_optional_sections_default() {
        let doc = LandmarkDocument::from_value(json!({ "landmarks": { "points": [null] } })).unwrap();
        assert!(doc.labels.is_empty());
        assert!(doc.landmarks.connectivity.is_empty());
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(LandmarkDocument::from_json_str("{ \"landmarks\": 3 }").is_err());
    }
}
