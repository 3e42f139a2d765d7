//! # Tracker
//!
//! Two-tier undo/redo history. Fine-grained operations and coarse full-state
//! checkpoints live in separate bounded logs, each entry tagged with a
//! revision. Recording anything new discards both redo buffers.
//!
//! The tracker never touches the tracked data itself. Undo and redo hand
//! entries to a [`History`] implementation that applies them.

use std::collections::VecDeque;

use super::listeners::{ListenerId, Listeners};
use crate::config::HistorySettings;

/// Applies tracker entries to the data being tracked.
pub trait History<O, S> {
    /// Replay an operation forwards.
    fn apply(&mut self, operation: &O);
    /// Undo the effect of an operation.
    fn revert(&mut self, operation: &O);
    /// Replace the tracked data with a checkpoint.
    fn restore(&mut self, state: &S);
}

/// What a tracker mutation did, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerChange {
    Recorded,
    StateRecorded,
    Undone,
    Redone,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry<T> {
    revision: u64,
    data: T,
}

#[derive(Debug)]
pub struct Tracker<O, S> {
    operations: VecDeque<Entry<O>>,
    states: VecDeque<Entry<S>>,
    future_operations: Vec<Entry<O>>,
    future_states: Vec<Entry<S>>,
    saved_revision: Option<u64>,
    next_revision: u64,
    max_operations: usize,
    max_states: usize,
    listeners: Listeners<TrackerChange>,
}

impl<O, S> Default for Tracker<O, S> {
    fn default() -> Self {
        Self::new(&HistorySettings::default())
    }
}

impl<O, S> Tracker<O, S> {
    pub fn new(settings: &HistorySettings) -> Self {
        Self {
            operations: VecDeque::new(),
            states: VecDeque::new(),
            future_operations: Vec::new(),
            future_states: Vec::new(),
            saved_revision: None,
            next_revision: 1,
            max_operations: settings.max_operations.max(1),
            max_states: settings.max_states.max(1),
            listeners: Listeners::new(),
        }
    }

    fn bump(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    fn clear_future(&mut self) {
        self.future_operations.clear();
        self.future_states.clear();
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&TrackerChange) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Push an operation, evicting the oldest past capacity.
    pub fn record(&mut self, operation: O) {
        let revision = self.bump();
        self.operations.push_back(Entry {
            revision,
            data: operation,
        });
        while self.operations.len() > self.max_operations {
            self.operations.pop_front();
        }
        self.clear_future();
        self.listeners.emit(&TrackerChange::Recorded);
    }

    /// Number of operations available to undo.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.operations.is_empty() || self.states.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future_operations.is_empty() || !self.future_states.is_empty()
    }

    /// No unsaved changes: the newest checkpoint is the saved one and no
    /// operation has been recorded on top of it.
    pub fn is_up_to_date(&self) -> bool {
        let Some(state) = self.states.back() else {
            return false;
        };
        let saved = self.saved_revision == Some(state.revision);
        match self.operations.back() {
            Some(operation) => operation.revision == state.revision && saved,
            None => saved,
        }
    }

    /// Revert the newest operation, or failing that step back one
    /// checkpoint. The last checkpoint is never popped.
    pub fn undo(&mut self, history: &mut impl History<O, S>) -> bool {
        if let Some(entry) = self.operations.pop_back() {
            history.revert(&entry.data);
            self.future_operations.push(entry);
        } else if self.states.len() > 1 {
            if let Some(entry) = self.states.pop_back() {
                self.future_states.push(entry);
            }
            if let Some(top) = self.states.back() {
                history.restore(&top.data);
            }
        } else {
            return false;
        }
        self.listeners.emit(&TrackerChange::Undone);
        true
    }

    /// Replay the most recently undone entry. Checkpoints take priority.
    pub fn redo(&mut self, history: &mut impl History<O, S>) -> bool {
        if let Some(entry) = self.future_states.pop() {
            history.restore(&entry.data);
            self.states.push_back(entry);
        } else if let Some(entry) = self.future_operations.pop() {
            history.apply(&entry.data);
            self.operations.push_back(entry);
        } else {
            return false;
        }
        self.listeners.emit(&TrackerChange::Redone);
        true
    }
}

impl<O, S: PartialEq> Tracker<O, S> {
    /// Record a checkpoint, marking it saved if `saved`.
    ///
    /// A checkpoint equal to the newest one, with no operation recorded since,
    /// reuses that checkpoint's revision instead of pushing a duplicate, unless
    /// `force` is set.
    pub fn record_state(&mut self, state: S, saved: bool, force: bool) {
        let top_operation = self.operations.back().map(|entry| entry.revision);

        let reused = match self.states.back() {
            Some(last) if !force && last.data == state => top_operation
                .map_or(true, |revision| revision == last.revision)
                .then_some(last.revision),
            _ => None,
        };

        let revision = match reused {
            Some(revision) => revision,
            None => {
                let revision = match top_operation {
                    Some(revision) => revision,
                    None => self.bump(),
                };
                self.states.push_back(Entry {
                    revision,
                    data: state,
                });
                while self.states.len() > self.max_states {
                    self.states.pop_front();
                }
                self.clear_future();
                revision
            }
        };

        if saved {
            self.saved_revision = Some(revision);
        }
        self.listeners.emit(&TrackerChange::StateRecorded);
    }
}
