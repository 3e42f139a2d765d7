//! Visual symbols for landmarks and their connectivity.
//!
//! Each present landmark owns exactly one [`LandmarkSymbol`], created when it
//! gains a point and disposed when it loses it. A [`ConnectionLine`] exists
//! while both of its endpoints do. All coordinates are mesh-local.

use cgmath::Point3;

use crate::model::Landmark;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSymbol {
    pub index: usize,
    pub center: Point3<f64>,
    pub selected: bool,
}

impl LandmarkSymbol {
    fn create(landmark: &Landmark) -> Option<Self> {
        Some(Self {
            index: landmark.index(),
            center: landmark.point()?,
            selected: landmark.is_selected(),
        })
    }

    /// Returns true if anything visible changed.
    fn update(&mut self, landmark: &Landmark) -> bool {
        let Some(center) = landmark.point() else {
            return false;
        };
        let changed = self.center != center || self.selected != landmark.is_selected();
        self.center = center;
        self.selected = landmark.is_selected();
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionLine {
    pub pair: [usize; 2],
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

#[derive(Debug, Default)]
pub struct SymbolSet {
    symbols: Vec<Option<LandmarkSymbol>>,
    connectivity: Vec<[usize; 2]>,
    lines: Vec<Option<ConnectionLine>>,
    /// Indices into `connectivity` touching each landmark
    lines_by_landmark: Vec<Vec<usize>>,
}

impl SymbolSet {
    /// Dispose every symbol and line, then build fresh ones.
    pub fn rebuild(&mut self, landmarks: &[Landmark], connectivity: &[[usize; 2]]) {
        self.dispose();

        self.symbols = landmarks.iter().map(LandmarkSymbol::create).collect();
        self.connectivity = connectivity.to_vec();
        self.lines_by_landmark = vec![Vec::new(); landmarks.len()];
        for (line, pair) in connectivity.iter().enumerate() {
            for &index in pair {
                if let Some(lines) = self.lines_by_landmark.get_mut(index) {
                    lines.push(line);
                }
            }
        }
        self.lines = (0..connectivity.len())
            .map(|line| self.make_line(line))
            .collect();

        log::debug!(
            "built {} landmark symbols and {} lines",
            self.symbol_count(),
            self.line_count()
        );
    }

    pub fn dispose(&mut self) {
        self.symbols.clear();
        self.lines.clear();
        self.connectivity.clear();
        self.lines_by_landmark.clear();
    }

    fn make_line(&self, line: usize) -> Option<ConnectionLine> {
        let pair = *self.connectivity.get(line)?;
        let start = self.symbols.get(pair[0])?.as_ref()?.center;
        let end = self.symbols.get(pair[1])?.as_ref()?.center;
        Some(ConnectionLine { pair, start, end })
    }

    /// Patch symbols whose landmark changed, plus their dependent lines.
    /// Returns the indices that changed visibly.
    pub fn sync(&mut self, landmarks: &[Landmark]) -> Vec<usize> {
        if landmarks.len() != self.symbols.len() {
            let connectivity = std::mem::take(&mut self.connectivity);
            self.rebuild(landmarks, &connectivity);
            return (0..landmarks.len()).collect();
        }

        let mut changed = Vec::new();
        for (slot, landmark) in self.symbols.iter_mut().zip(landmarks) {
            let dirty = match (slot.as_mut(), landmark.point()) {
                (Some(symbol), Some(_)) => symbol.update(landmark),
                (None, Some(_)) => {
                    *slot = LandmarkSymbol::create(landmark);
                    true
                }
                (Some(_), None) => {
                    *slot = None;
                    true
                }
                (None, None) => false,
            };
            if dirty {
                changed.push(landmark.index());
            }
        }

        let mut lines: Vec<usize> = changed
            .iter()
            .flat_map(|&index| self.lines_by_landmark[index].iter().copied())
            .collect();
        lines.sort_unstable();
        lines.dedup();
        for line in lines {
            self.lines[line] = self.make_line(line);
        }

        changed
    }

    pub fn symbol(&self, index: usize) -> Option<&LandmarkSymbol> {
        self.symbols.get(index)?.as_ref()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &LandmarkSymbol> {
        self.symbols.iter().flatten()
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConnectionLine> {
        self.lines.iter().flatten()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols().count()
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupKey, LandmarkGroup, LandmarkTracker};
    use crate::interaction::ViewportCallbacks;

    fn group() -> LandmarkGroup {
        LandmarkGroup::new(
            GroupKey::new("a", "t"),
            vec![Some(Point3::new(0.0, 0.0, 0.0)), None, Some(Point3::new(1.0, 0.0, 0.0))],
            3,
            vec![[0, 1], [0, 2]],
            Vec::new(),
            LandmarkTracker::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_lines_need_both_endpoints() {
        let group = group();
        let mut set = SymbolSet::default();
        set.rebuild(group.landmarks(), group.connectivity());

        assert_eq!(set.symbol_count(), 2);
        assert_eq!(set.line_count(), 1);
        assert_eq!(set.lines().next().map(|line| line.pair), Some([0, 2]));
    }

    #[test]
    fn test_sync_creates_updates_and_disposes() {
        let mut group = group();
        let mut set = SymbolSet::default();
        set.rebuild(group.landmarks(), group.connectivity());

        group.set_landmark_point(1, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(set.sync(group.landmarks()), vec![1]);
        assert_eq!(set.line_count(), 2);

        group.set_landmark_point(0, Point3::new(0.0, 0.0, 5.0));
        assert_eq!(set.sync(group.landmarks()), vec![0]);
        assert!(set.lines().all(|line| line.start == Point3::new(0.0, 0.0, 5.0)));

        group.select(&[2]);
        group.select(&[0]);
        group.deselect(&[0]);
        assert_eq!(set.sync(group.landmarks()), vec![2]);

        group.select(&[2]);
        group.delete_selected();
        assert_eq!(set.sync(group.landmarks()), vec![2]);
        assert!(set.symbol(2).is_none());
        assert_eq!(set.line_count(), 1);

        assert!(set.sync(group.landmarks()).is_empty());
    }
}
