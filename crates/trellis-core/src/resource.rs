//! Disposable resources tied to an element's lifetime.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle to a resource an element promised to release before disposal.
///
/// Dropping the handle counts as releasing it.
pub struct TrackedResource {
    label: Rc<str>,
    released: Rc<Cell<bool>>,
}

impl TrackedResource {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn release(&self) {
        self.released.set(true);
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}

impl Drop for TrackedResource {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

impl fmt::Debug for TrackedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedResource")
            .field("label", &self.label)
            .field("released", &self.released.get())
            .finish()
    }
}

#[derive(Default)]
pub(crate) struct ResourceLedger {
    entries: RefCell<Vec<(Rc<str>, Rc<Cell<bool>>)>>,
}

impl ResourceLedger {
    pub(crate) fn track(&self, label: Rc<str>) -> TrackedResource {
        let released = Rc::new(Cell::new(false));
        self.entries
            .borrow_mut()
            .push((label.clone(), released.clone()));
        TrackedResource { label, released }
    }

    /// Labels of resources still held, draining the ledger.
    pub(crate) fn take_leaked(&self) -> Vec<String> {
        self.entries
            .take()
            .into_iter()
            .filter(|(_, released)| !released.get())
            .map(|(label, _)| label.to_string())
            .collect()
    }
}
