//! # Landmark Group
//!
//! The landmarks, connectivity and labels of one asset under one template,
//! together with the undo history that mutates them.

use cgmath::Point3;

use super::document::{Coord, LabelEntry, LandmarkDocument, LandmarksSection, DOCUMENT_VERSION};
use super::label::Label;
use super::landmark::Landmark;
use super::listeners::{ListenerId, Listeners};
use super::tracker::{History, Tracker};
use crate::error::{Error, Result};
use crate::interaction::ViewportCallbacks;

/// One landmark moving between two (possibly empty) positions.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMove {
    pub index: usize,
    pub from: Option<Point3<f64>>,
    pub to: Option<Point3<f64>>,
}

/// Every landmark's point, in order.
pub type Snapshot = Vec<Option<Point3<f64>>>;

pub type LandmarkTracker = Tracker<Vec<PointMove>, Snapshot>;

/// Identifies a group: an asset annotated with a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub asset: String,
    pub template: String,
}

impl GroupKey {
    pub fn new(asset: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            template: template.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    PointsChanged(Vec<usize>),
    SelectionChanged,
    NextAvailableChanged(Option<usize>),
    HistoryChanged,
}

/// The landmark list on its own, so the tracker can mutate it while the group
/// still holds the tracker.
#[derive(Debug, Default)]
struct LandmarkSet {
    landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    fn snapshot(&self) -> Snapshot {
        self.landmarks.iter().map(Landmark::point).collect()
    }

    fn set(&mut self, index: usize, point: Option<Point3<f64>>) {
        if let Some(lm) = self.landmarks.get_mut(index) {
            lm.set_point(point);
        }
    }
}

impl History<Vec<PointMove>, Snapshot> for LandmarkSet {
    fn apply(&mut self, operation: &Vec<PointMove>) {
        for step in operation {
            self.set(step.index, step.to);
        }
    }

    fn revert(&mut self, operation: &Vec<PointMove>) {
        for step in operation.iter().rev() {
            self.set(step.index, step.from);
        }
    }

    fn restore(&mut self, state: &Snapshot) {
        for (lm, point) in self.landmarks.iter_mut().zip(state) {
            lm.set_point(*point);
        }
    }
}

/// A landmark document that passed every construction check, waiting for
/// the tracker that will own its history.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    points: Snapshot,
    dims: usize,
    connectivity: Vec<[usize; 2]>,
    labels: Vec<Label>,
    written: Vec<Option<Vec<Coord>>>,
}

impl ParsedDocument {
    /// Parse and validate a persisted document. `dims` is used when every
    /// point is empty.
    pub fn parse(document: &LandmarkDocument, dims: usize) -> Result<Self> {
        let mut found_dims = None;
        let mut points = Vec::with_capacity(document.landmarks.points.len());

        for (index, point) in document.landmarks.points.iter().enumerate() {
            let Some(coords) = point else {
                points.push(None);
                continue;
            };
            let point = match coords.as_slice() {
                [x, y] => Point3::new(x.value(), y.value(), 0.0),
                [x, y, z] => Point3::new(x.value(), y.value(), z.value()),
                _ => {
                    return Err(Error::InvalidPoint {
                        index,
                        dims: coords.len(),
                    })
                }
            };
            match found_dims {
                Some(d) if d != coords.len() => return Err(Error::MixedDimensions),
                _ => found_dims = Some(coords.len()),
            }
            points.push(Some(point));
        }

        let len = points.len();
        let labels = document
            .labels
            .iter()
            .map(|entry| Label::new(entry.label.clone(), entry.mask.clone(), len))
            .collect::<Result<Vec<_>>>()?;
        let connectivity = document.landmarks.connectivity.clone();
        check_indices(len, &connectivity, &labels)?;

        Ok(Self {
            points,
            dims: found_dims.unwrap_or(dims),
            connectivity,
            labels,
            written: document.landmarks.points.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Build the group. Points keep the form they were written in until
    /// they move.
    pub fn into_group(self, key: GroupKey, tracker: LandmarkTracker) -> LandmarkGroup {
        let mut group = LandmarkGroup::assemble(
            key,
            self.points,
            self.dims,
            self.connectivity,
            self.labels,
            tracker,
        );
        group.written = group
            .set
            .landmarks
            .iter()
            .zip(self.written)
            .map(|(lm, coords)| Some((lm.point()?, coords?)))
            .collect();
        group
    }
}

/// Fail on any connectivity pair or label index outside `len` landmarks.
fn check_indices(len: usize, connectivity: &[[usize; 2]], labels: &[Label]) -> Result<()> {
    for pair in connectivity {
        if let Some(&index) = pair.iter().find(|&&index| index >= len) {
            return Err(Error::ConnectivityOutOfRange {
                pair: *pair,
                index,
                len,
            });
        }
    }
    for label in labels {
        if let Some(&index) = label.mask().iter().find(|&&index| index >= len) {
            return Err(Error::LabelOutOfRange {
                label: label.name().to_string(),
                index,
                len,
            });
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct LandmarkGroup {
    key: GroupKey,
    dims: usize,
    set: LandmarkSet,
    connectivity: Vec<[usize; 2]>,
    labels: Vec<Label>,
    /// Per landmark, the loaded point and its coordinates as written
    written: Vec<Option<(Point3<f64>, Vec<Coord>)>>,
    tracker: LandmarkTracker,
    listeners: Listeners<GroupEvent>,
}

impl LandmarkGroup {
    /// Build a group, failing on any connectivity pair or label index outside
    /// `points`. The current points become the saved checkpoint.
    pub fn new(
        key: GroupKey,
        points: Vec<Option<Point3<f64>>>,
        dims: usize,
        connectivity: Vec<[usize; 2]>,
        labels: Vec<Label>,
        tracker: LandmarkTracker,
    ) -> Result<Self> {
        check_indices(points.len(), &connectivity, &labels)?;
        Ok(Self::assemble(
            key,
            points,
            dims,
            connectivity,
            labels,
            tracker,
        ))
    }

    fn assemble(
        key: GroupKey,
        points: Vec<Option<Point3<f64>>>,
        dims: usize,
        connectivity: Vec<[usize; 2]>,
        labels: Vec<Label>,
        tracker: LandmarkTracker,
    ) -> Self {
        let landmarks: Vec<Landmark> = points
            .into_iter()
            .enumerate()
            .map(|(index, point)| Landmark::new(index, point.map(|p| flatten(p, dims))))
            .collect();

        let mut group = Self {
            key,
            dims,
            written: vec![None; landmarks.len()],
            set: LandmarkSet { landmarks },
            connectivity,
            labels,
            tracker,
            listeners: Listeners::new(),
        };
        group.tracker.record_state(group.set.snapshot(), true, false);
        group.reset_next_available(None);
        group
    }

    /// Parse a persisted document. `dims` is used when every point is empty.
    pub fn from_document(
        document: &LandmarkDocument,
        key: GroupKey,
        dims: usize,
        tracker: LandmarkTracker,
    ) -> Result<Self> {
        Ok(ParsedDocument::parse(document, dims)?.into_group(key, tracker))
    }

    pub fn to_document(&self) -> LandmarkDocument {
        let points = self
            .set
            .landmarks
            .iter()
            .zip(&self.written)
            .map(|(lm, written)| {
                let point = lm.point()?;
                if let Some((loaded, coords)) = written {
                    if *loaded == point {
                        return Some(coords.clone());
                    }
                }
                let values = match self.dims {
                    2 => vec![point.x, point.y],
                    _ => vec![point.x, point.y, point.z],
                };
                Some(values.into_iter().map(Coord::from).collect())
            })
            .collect();

        LandmarkDocument {
            landmarks: LandmarksSection {
                points,
                connectivity: self.connectivity.clone(),
            },
            labels: self
                .labels
                .iter()
                .map(|label| LabelEntry {
                    label: label.name().to_string(),
                    mask: label.mask().to_vec(),
                })
                .collect(),
            version: DOCUMENT_VERSION,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.set.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.landmarks.is_empty()
    }

    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.set.landmarks.get(index)
    }

    pub fn connectivity(&self) -> &[[usize; 2]] {
        &self.connectivity
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn snapshot(&self) -> Snapshot {
        self.set.snapshot()
    }

    pub fn tracker(&self) -> &LandmarkTracker {
        &self.tracker
    }

    /// Tear the group down, handing back its history for reuse.
    pub fn into_tracker(mut self) -> LandmarkTracker {
        self.listeners.clear();
        self.tracker
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GroupEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit(&mut self, event: GroupEvent) {
        self.listeners.emit(&event);
    }

    // selection

    pub fn selected(&self) -> Vec<usize> {
        self.selected_indices()
    }

    pub fn select(&mut self, indices: &[usize]) {
        let mut changed = false;
        for &index in indices {
            if let Some(lm) = self.set.landmarks.get_mut(index) {
                changed |= lm.set_selected(true);
            }
        }
        if changed {
            self.emit(GroupEvent::SelectionChanged);
        }
    }

    pub fn deselect(&mut self, indices: &[usize]) {
        let mut changed = false;
        for &index in indices {
            if let Some(lm) = self.set.landmarks.get_mut(index) {
                changed |= lm.set_selected(false);
            }
        }
        if changed {
            self.emit(GroupEvent::SelectionChanged);
        }
    }

    pub fn select_all(&mut self) {
        let all: Vec<usize> = (0..self.len()).collect();
        self.select(&all);
    }

    pub fn deselect_all(&mut self) {
        let all: Vec<usize> = (0..self.len()).collect();
        self.deselect(&all);
    }

    /// Select exactly `indices`.
    pub fn select_only(&mut self, indices: &[usize]) {
        let mut changed = false;
        for lm in &mut self.set.landmarks {
            changed |= lm.set_selected(indices.contains(&lm.index()));
        }
        if changed {
            self.emit(GroupEvent::SelectionChanged);
        }
    }

    pub fn select_and_deselect_rest(&mut self, index: usize) {
        self.select_only(&[index]);
    }

    /// Select exactly the landmarks of the named label. Returns false if no
    /// such label exists.
    pub fn select_label(&mut self, name: &str) -> bool {
        let Some(mask) = self
            .labels
            .iter()
            .find(|label| label.name() == name)
            .map(|label| label.mask().to_vec())
        else {
            return false;
        };
        self.select_only(&mask);
        true
    }

    /// Labels containing at least one selected landmark.
    pub fn labels_with_selection(&self) -> Vec<&Label> {
        let selected = self.selected();
        self.labels
            .iter()
            .filter(|label| selected.iter().any(|&index| label.contains(index)))
            .collect()
    }

    // next available

    pub fn has_empty(&self) -> bool {
        self.set.landmarks.iter().any(Landmark::is_empty)
    }

    pub fn next_available(&self) -> Option<usize> {
        ViewportCallbacks::next_available(self)
    }

    pub fn clear_all_next_available(&mut self) {
        let mut changed = false;
        for lm in &mut self.set.landmarks {
            changed |= lm.set_next_available(false);
        }
        if changed {
            self.emit(GroupEvent::NextAvailableChanged(None));
        }
    }

    /// Mark `index` as the slot for the next insertion. Only empty slots
    /// qualify; returns false otherwise.
    pub fn set_next_available(&mut self, index: usize) -> bool {
        if !self.set.landmarks.get(index).is_some_and(Landmark::is_empty) {
            return false;
        }
        for lm in &mut self.set.landmarks {
            lm.set_next_available(lm.index() == index);
        }
        self.emit(GroupEvent::NextAvailableChanged(Some(index)));
        true
    }

    /// Move "next available" to the first empty slot after `origin`,
    /// wrapping around. Without an origin the search starts at the first
    /// slot. Clears the flag when nothing is empty.
    pub fn reset_next_available(&mut self, origin: Option<usize>) -> Option<usize> {
        let len = self.len();
        let start = origin.map_or(0, |index| index + 1);
        let found = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&index| self.set.landmarks[index].is_empty());

        match found {
            Some(index) => {
                self.set_next_available(index);
            }
            None => self.clear_all_next_available(),
        }
        found
    }

    /// Keep the next-available flag on an empty slot after history replays.
    fn repair_next_available(&mut self) {
        let current = self.next_available();
        if current.is_none() || current.is_some_and(|index| !self.set.landmarks[index].is_empty()) {
            self.reset_next_available(current);
        }
    }

    // points

    fn flatten(&self, point: Point3<f64>) -> Point3<f64> {
        flatten(point, self.dims)
    }

    /// Fill the next available slot and select it. Returns the slot used.
    pub fn insert_new(&mut self, point: Point3<f64>) -> Option<usize> {
        let index = self.next_available()?;
        let point = self.flatten(point);
        self.tracker.record(vec![PointMove {
            index,
            from: None,
            to: Some(point),
        }]);
        self.set.set(index, Some(point));
        log::debug!("inserted landmark {} at {:?}", index, point);

        self.emit(GroupEvent::PointsChanged(vec![index]));
        self.select_and_deselect_rest(index);
        self.reset_next_available(Some(index));
        self.emit(GroupEvent::HistoryChanged);
        Some(index)
    }

    /// Move a landmark, recording the move.
    pub fn set_lm_at(&mut self, index: usize, point: Point3<f64>) {
        let Some(lm) = self.set.landmarks.get(index) else {
            return;
        };
        let point = self.flatten(point);
        let from = lm.point();
        if from == Some(point) {
            return;
        }
        let was_next = lm.is_next_available();

        self.tracker.record(vec![PointMove {
            index,
            from,
            to: Some(point),
        }]);
        self.set.set(index, Some(point));
        self.emit(GroupEvent::PointsChanged(vec![index]));
        if was_next {
            self.reset_next_available(Some(index));
        }
        self.emit(GroupEvent::HistoryChanged);
    }

    /// Empty every selected landmark as a single undoable step.
    pub fn delete_selected(&mut self) -> Vec<usize> {
        let moves: Vec<PointMove> = self
            .set
            .landmarks
            .iter()
            .filter(|lm| lm.is_selected())
            .map(|lm| PointMove {
                index: lm.index(),
                from: lm.point(),
                to: None,
            })
            .collect();
        if moves.is_empty() {
            return Vec::new();
        }

        let indices: Vec<usize> = moves.iter().map(|step| step.index).collect();
        for &index in &indices {
            self.set.set(index, None);
        }
        self.tracker.record(moves);

        self.emit(GroupEvent::PointsChanged(indices.clone()));
        self.emit(GroupEvent::SelectionChanged);
        if self.next_available().is_none() {
            self.reset_next_available(None);
        }
        self.emit(GroupEvent::HistoryChanged);
        indices
    }

    // history

    pub fn can_undo(&self) -> bool {
        self.tracker.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.tracker.can_redo()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.tracker.is_up_to_date()
    }

    fn after_replay(&mut self) {
        self.repair_next_available();
        let all: Vec<usize> = (0..self.len()).collect();
        self.emit(GroupEvent::PointsChanged(all));
        self.emit(GroupEvent::HistoryChanged);
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.tracker.undo(&mut self.set);
        if undone {
            self.after_replay();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.tracker.redo(&mut self.set);
        if redone {
            self.after_replay();
        }
        redone
    }

    /// Checkpoint the current points as saved.
    pub fn mark_saved(&mut self) {
        self.tracker.record_state(self.set.snapshot(), true, false);
        self.emit(GroupEvent::HistoryChanged);
    }
}

/// Drop the z coordinate of 2D landmarks.
fn flatten(point: Point3<f64>, dims: usize) -> Point3<f64> {
    if dims == 2 {
        Point3::new(point.x, point.y, 0.0)
    } else {
        point
    }
}

impl ViewportCallbacks for LandmarkGroup {
    fn landmarks(&self) -> &[Landmark] {
        &self.set.landmarks
    }

    fn select_landmarks(&mut self, indices: &[usize]) {
        self.select(indices);
    }

    fn deselect_landmarks(&mut self, indices: &[usize]) {
        self.deselect(indices);
    }

    fn deselect_all_landmarks(&mut self) {
        self.deselect_all();
    }

    fn select_landmark_and_deselect_rest(&mut self, index: usize) {
        self.select_and_deselect_rest(index);
    }

    fn set_landmark_point(&mut self, index: usize, point: Point3<f64>) {
        let point = self.flatten(point);
        if index < self.len() {
            self.set.set(index, Some(point));
            self.emit(GroupEvent::PointsChanged(vec![index]));
        }
    }

    fn set_landmark_point_with_history(&mut self, index: usize, point: Point3<f64>) {
        self.set_lm_at(index, point);
    }

    fn add_landmark_history(&mut self, origins: &[(usize, Option<Point3<f64>>)]) {
        let moves: Vec<PointMove> = origins
            .iter()
            .filter_map(|&(index, from)| {
                let to = self.set.landmarks.get(index)?.point();
                (to != from).then_some(PointMove { index, from, to })
            })
            .collect();
        if moves.is_empty() {
            return;
        }
        self.tracker.record(moves);
        self.emit(GroupEvent::HistoryChanged);
    }

    fn insert_new_landmark(&mut self, point: Point3<f64>) {
        self.insert_new(point);
    }
}
