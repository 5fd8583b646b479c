use indexmap::IndexMap;

use crate::element::{Element, ElementId};

/// Elements deactivated during the current pass and not yet reclaimed.
#[derive(Default)]
pub(crate) struct InactiveElements {
    elements: IndexMap<ElementId, Element>,
}

impl InactiveElements {
    pub(crate) fn add(&mut self, element: Element) {
        self.elements.insert(element.id(), element);
    }

    pub(crate) fn remove(&mut self, element: &Element) -> bool {
        self.elements.shift_remove(&element.id()).is_some()
    }

    pub(crate) fn contains(&self, element: &Element) -> bool {
        self.elements.contains_key(&element.id())
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    /// Empties the list, deepest elements first.
    pub(crate) fn take_deepest_first(&mut self) -> Vec<Element> {
        let mut elements: Vec<Element> = self.elements.drain(..).map(|(_, element)| element).collect();
        elements.sort_by(|a, b| b.depth().cmp(&a.depth()));
        elements
    }
}
