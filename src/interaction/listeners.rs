use std::collections::HashSet;

/// Document-level listeners a press can install for the rest of a drag.
///
/// While attached, move and release events are routed to the owning gesture
/// even after the pointer leaves the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Listener {
    CameraDrag,
    LandmarkDrag,
    ShiftDrag,
    MeshPress,
    NothingPress,
}

#[derive(Debug, Default)]
pub struct DocumentListeners {
    attached: HashSet<Listener>,
}

impl DocumentListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the listener was already attached.
    pub fn attach(&mut self, listener: Listener) -> bool {
        let added = self.attached.insert(listener);
        if added {
            log::trace!("attached {:?}", listener);
        }
        added
    }

    pub fn detach(&mut self, listener: Listener) -> bool {
        let removed = self.attached.remove(&listener);
        if removed {
            log::trace!("detached {:?}", listener);
        }
        removed
    }

    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    /// Remove everything, returning what was attached in a stable order.
    pub fn detach_all(&mut self) -> Vec<Listener> {
        let mut removed: Vec<_> = self.attached.drain().collect();
        removed.sort();
        if !removed.is_empty() {
            log::debug!("detached all document listeners: {:?}", removed);
        }
        removed
    }
}
