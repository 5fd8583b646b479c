//! Global key table.
//!
//! Maps each [`GlobalKey`] to the element currently using it. The most
//! recent registration wins the lookup; a registration that displaces a
//! still-live element is remembered and checked at the end of the pass.

use indexmap::IndexSet;

use crate::collections::map::HashMap;
use crate::element::{Element, Lifecycle, WeakElement};
use crate::key::GlobalKey;

#[derive(Default)]
pub(crate) struct GlobalKeyRegistry {
    entries: HashMap<GlobalKey, Element>,
    removed: IndexSet<GlobalKey>,
    contested: HashMap<GlobalKey, Vec<WeakElement>>,
}

impl GlobalKeyRegistry {
    pub(crate) fn register(&mut self, key: &GlobalKey, element: &Element) {
        if let Some(existing) = self.entries.get(key) {
            if !existing.ptr_eq(element) && existing.lifecycle() != Lifecycle::Defunct {
                log::trace!("{key} registered by {element} while held by {existing}");
                let claimants = self.contested.entry(key.clone()).or_default();
                claimants.push(existing.downgrade());
                claimants.push(element.downgrade());
            }
        }
        self.removed.shift_remove(key);
        self.entries.insert(key.clone(), element.clone());
    }

    /// Clears the entry for `key` if `element` still holds it.
    pub(crate) fn unregister(&mut self, key: &GlobalKey, element: &Element) -> bool {
        match self.entries.get(key) {
            Some(existing) if existing.ptr_eq(element) => {
                self.entries.remove(key);
                self.removed.insert(key.clone());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn lookup(&self, key: &GlobalKey) -> Option<Element> {
        self.entries.get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keys that ended up unregistered since the last call.
    pub(crate) fn take_removed(&mut self) -> Vec<GlobalKey> {
        self.removed.drain(..).collect()
    }

    /// Keys that more than one live element claims, with a description of
    /// the claimants. Clears the contested set.
    pub(crate) fn take_duplicates(&mut self) -> Vec<String> {
        let mut report = Vec::new();
        for (key, claimants) in self.contested.drain() {
            let mut live: Vec<Element> = Vec::new();
            for element in claimants.iter().filter_map(WeakElement::upgrade) {
                if element.lifecycle() != Lifecycle::Defunct
                    && !live.iter().any(|seen| seen.ptr_eq(&element))
                {
                    live.push(element);
                }
            }
            if live.len() > 1 {
                let names: Vec<String> = live.iter().map(ToString::to_string).collect();
                report.push(format!("{key} used by {}", names.join(", ")));
            }
        }
        report.sort();
        report
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
