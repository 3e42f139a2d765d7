use cgmath::Point3;

/// One slot of a landmark group.
///
/// An empty slot (no point) is never selected. Only an empty slot may be the
/// group's next available slot; the group enforces that at most one is.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    index: usize,
    point: Option<Point3<f64>>,
    selected: bool,
    next_available: bool,
}

impl Landmark {
    pub fn new(index: usize, point: Option<Point3<f64>>) -> Self {
        Self {
            index,
            point,
            selected: false,
            next_available: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn point(&self) -> Option<Point3<f64>> {
        self.point
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_none()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_next_available(&self) -> bool {
        self.next_available
    }

    pub(crate) fn set_point(&mut self, point: Option<Point3<f64>>) {
        self.point = point;
        if point.is_none() {
            self.selected = false;
        } else {
            self.next_available = false;
        }
    }

    /// Returns whether the flag changed. Empty landmarks cannot be selected.
    pub(crate) fn set_selected(&mut self, selected: bool) -> bool {
        let selected = selected && self.point.is_some();
        let changed = self.selected != selected;
        self.selected = selected;
        changed
    }

    pub(crate) fn set_next_available(&mut self, next_available: bool) -> bool {
        let next_available = next_available && self.point.is_none();
        let changed = self.next_available != next_available;
        self.next_available = next_available;
        changed
    }
}
