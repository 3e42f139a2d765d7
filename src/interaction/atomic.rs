//! Render suppression for compound updates.
//!
//! While any [`AtomicGuard`] is alive, render requests are only recorded.
//! Once the last guard drops, the owner flushes at most one render.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct State {
    depth: Cell<usize>,
    dirty: Cell<bool>,
}

/// Shared handle to the suppression state. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct AtomicOperation {
    state: Rc<State>,
}

/// Keeps the operation open until dropped. Guards nest.
#[derive(Debug)]
#[must_use = "the atomic operation ends when the guard is dropped"]
pub struct AtomicGuard {
    state: Rc<State>,
}

impl Drop for AtomicGuard {
    fn drop(&mut self) {
        let depth = self.state.depth.get();
        self.state.depth.set(depth.saturating_sub(1));
    }
}

impl AtomicOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> AtomicGuard {
        self.state.depth.set(self.state.depth.get() + 1);
        AtomicGuard {
            state: Rc::clone(&self.state),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.depth.get() > 0
    }

    /// Returns true when the caller should render right away. Inside an
    /// atomic operation the request is deferred instead.
    pub fn request_render(&self) -> bool {
        if self.is_active() {
            self.state.dirty.set(true);
            false
        } else {
            true
        }
    }

    /// Consume a deferred render once no guard is alive.
    pub fn take_pending(&self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state.dirty.replace(false)
    }
}
