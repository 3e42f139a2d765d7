use std::fmt;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A typed subscribe/unsubscribe registry for change notifications.
pub struct Listeners<E> {
    next_id: u64,
    callbacks: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    /// Drop every subscriber, e.g. when the owner is torn down.
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }
}
