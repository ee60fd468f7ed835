//! Keyboard listener registry.
//!
//! Components that want keyboard input attach a listener for their [`Layer`]
//! and keep the returned [`ListenerGuard`] for as long as they listen. The
//! app routes each key event to the most recently attached layer.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

/// Who a listener belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Lightbox,
    ContactForm,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Layer)>,
}

/// Shared handle to the registry.
#[derive(Clone, Default)]
pub struct KeyListeners {
    inner: Rc<RefCell<Registry>>,
}

impl KeyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, layer: Layer) -> ListenerGuard {
        let mut registry = self.inner.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push((id, layer));
        debug!(?layer, id, "key listener attached");
        ListenerGuard {
            id,
            registry: Rc::clone(&self.inner),
        }
    }

    /// Layer that currently receives key events, if any.
    pub fn top(&self) -> Option<Layer> {
        self.inner.borrow().entries.last().map(|(_, layer)| *layer)
    }

    pub fn count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn count_for(&self, layer: Layer) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, l)| *l == layer)
            .count()
    }
}

/// Attached listener; detaches when dropped.
pub struct ListenerGuard {
    id: u64,
    registry: Rc<RefCell<Registry>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.borrow_mut();
        registry.entries.retain(|(id, _)| *id != self.id);
        debug!(id = self.id, "key listener detached");
    }
}
