use cgmath::Point3;

use crate::model::Landmark;

/// Everything the gesture handlers may do to landmark state.
///
/// Points are in mesh-local coordinates. Methods without "history" in their
/// name never record undo entries; a drag moves landmarks live with
/// [`set_landmark_point`](Self::set_landmark_point) and records once on
/// release through [`add_landmark_history`](Self::add_landmark_history).
pub trait ViewportCallbacks {
    fn landmarks(&self) -> &[Landmark];

    fn select_landmarks(&mut self, indices: &[usize]);

    fn deselect_landmarks(&mut self, indices: &[usize]);

    fn deselect_all_landmarks(&mut self);

    fn select_landmark_and_deselect_rest(&mut self, index: usize);

    fn set_landmark_point(&mut self, index: usize, point: Point3<f64>);

    fn set_landmark_point_with_history(&mut self, index: usize, point: Point3<f64>);

    /// Record one undoable step moving each landmark from its origin to its
    /// current point.
    fn add_landmark_history(&mut self, origins: &[(usize, Option<Point3<f64>>)]);

    /// Place a point in the next available slot, if any.
    fn insert_new_landmark(&mut self, point: Point3<f64>);

    fn next_available(&self) -> Option<usize> {
        self.landmarks()
            .iter()
            .find(|lm| lm.is_next_available())
            .map(Landmark::index)
    }

    fn selected_indices(&self) -> Vec<usize> {
        self.landmarks()
            .iter()
            .filter(|lm| lm.is_selected())
            .map(Landmark::index)
            .collect()
    }
}
