//! Child reconciliation.

use crate::collections::map::HashMap;
use crate::key::{GlobalKey, Key};
use crate::widget::Widget;

use super::{Children, Element, Slot};

impl Element {
    /// Reconciles one child position.
    ///
    /// | child  | widget | result                                      |
    /// |--------|--------|---------------------------------------------|
    /// | `None` | `None` | `None`                                      |
    /// | `Some` | `None` | old child deactivated, `None`               |
    /// | `None` | `Some` | new element inflated                        |
    /// | `Some` | `Some` | updated in place if compatible, else replaced |
    pub(crate) fn update_child(
        &self,
        child: Option<Element>,
        widget: Option<&Widget>,
        slot: Slot,
    ) -> Option<Element> {
        let Some(widget) = widget else {
            if let Some(child) = child {
                self.deactivate_child(&child);
            }
            return None;
        };
        let Some(child) = child else {
            return Some(self.inflate(widget.clone(), slot));
        };
        let current = child.widget();
        if current.ptr_eq(widget) {
            if child.slot() != slot {
                self.update_slot_for_child(&child, slot);
            }
            return Some(child);
        }
        if current.can_update(widget) {
            if child.slot() != slot {
                self.update_slot_for_child(&child, slot);
            }
            child.update(widget.clone());
            return Some(child);
        }
        self.deactivate_child(&child);
        Some(self.inflate(widget.clone(), slot))
    }

    /// Reconciles an ordered child list, matching by position at both ends
    /// and by key in the middle.
    pub(crate) fn update_children(&self, old: Vec<Element>, widgets: &[Widget]) -> Vec<Element> {
        let live = |child: &Element| -> Option<Element> {
            (!self.is_forgotten(child)).then(|| child.clone())
        };

        let mut result: Vec<Option<Element>> = vec![None; widgets.len()];
        let mut previous: Option<Element> = None;
        let mut new_top = 0;
        let mut old_top = 0;
        let mut new_end = widgets.len();
        let mut old_end = old.len();

        while old_top < old_end && new_top < new_end {
            let Some(old_child) = live(&old[old_top]) else {
                break;
            };
            let widget = &widgets[new_top];
            if !old_child.widget().can_update(widget) {
                break;
            }
            let child = self.update_child(
                Some(old_child),
                Some(widget),
                Slot::indexed(new_top, previous.as_ref()),
            );
            previous = child.clone();
            result[new_top] = child;
            new_top += 1;
            old_top += 1;
        }

        while old_top < old_end && new_top < new_end {
            let Some(old_child) = live(&old[old_end - 1]) else {
                break;
            };
            if !old_child.widget().can_update(&widgets[new_end - 1]) {
                break;
            }
            old_end -= 1;
            new_end -= 1;
        }

        let has_old_middle = old_top < old_end;
        // Siblings may share a key. Claimants left unmatched are deactivated
        // at the end.
        let mut keyed: HashMap<Key, Vec<Element>> = HashMap::default();
        while old_top < old_end {
            if let Some(old_child) = live(&old[old_top]) {
                match old_child.key() {
                    Some(key) => {
                        let claimants = keyed.entry(key).or_default();
                        if let Some(first) = claimants.first() {
                            log::warn!("{old_child} shares its key with {first} under {self}");
                        }
                        claimants.push(old_child);
                    }
                    None => self.deactivate_child(&old_child),
                }
            }
            old_top += 1;
        }

        while new_top < new_end {
            let widget = &widgets[new_top];
            let mut old_child = None;
            if has_old_middle {
                if let Some(claimants) = widget.key().and_then(|key| keyed.get_mut(key)) {
                    if let Some(index) = claimants
                        .iter()
                        .position(|candidate| candidate.widget().can_update(widget))
                    {
                        old_child = Some(claimants.remove(index));
                    }
                }
            }
            let child = self.update_child(
                old_child,
                Some(widget),
                Slot::indexed(new_top, previous.as_ref()),
            );
            previous = child.clone();
            result[new_top] = child;
            new_top += 1;
        }

        while new_top < widgets.len() {
            let child = self.update_child(
                Some(old[old_top].clone()),
                Some(&widgets[new_top]),
                Slot::indexed(new_top, previous.as_ref()),
            );
            previous = child.clone();
            result[new_top] = child;
            new_top += 1;
            old_top += 1;
        }

        for old_child in keyed.into_values().flatten() {
            if !self.is_forgotten(&old_child) {
                self.deactivate_child(&old_child);
            }
        }

        result.into_iter().flatten().collect()
    }

    /// Creates an element for `widget`, or reclaims the one holding its
    /// global key.
    pub(crate) fn inflate(&self, widget: Widget, slot: Slot) -> Element {
        let global = widget.key().and_then(Key::as_global).cloned();
        if let Some(key) = global {
            if let Some(reclaimed) = self.reclaim(&key, &widget, slot.clone()) {
                return reclaimed;
            }
        }
        let element = Element::new(widget);
        element.mount(Some(self), slot);
        element
    }

    fn reclaim(&self, key: &GlobalKey, widget: &Widget, slot: Slot) -> Option<Element> {
        let owner = self.owner()?;
        let element = owner.retake(key, widget, self).ok()??;
        log::trace!("graft {element} under {self}");
        element.activate_with_parent(self, slot.clone());
        let updated = self.update_child(Some(element.clone()), Some(widget), slot);
        Some(updated.unwrap_or(element))
    }

    /// Detaches `child` and hands it to the owner's inactive list.
    pub(crate) fn deactivate_child(&self, child: &Element) {
        *child.inner.parent.borrow_mut() = None;
        child.detach_primitive();
        if let Some(owner) = self.owner() {
            owner.deactivate_into_inactive(child);
        }
    }

    /// Stops tracking a child that is being grafted elsewhere.
    pub(crate) fn forget_child(&self, child: &Element) {
        let mut children = self.inner.children.borrow_mut();
        match &mut *children {
            Children::Single(current) => {
                if current.as_ref().is_some_and(|current| current.ptr_eq(child)) {
                    *current = None;
                }
            }
            Children::Multi(_) => {
                self.inner.forgotten.borrow_mut().insert(child.id());
            }
            Children::Leaf => {}
        }
    }

    /// Gives `child` a new slot, following single-child composites down to
    /// the element that owns a primitive.
    pub(crate) fn update_slot_for_child(&self, child: &Element, slot: Slot) {
        let mut current = Some(child.clone());
        while let Some(element) = current {
            element.update_slot(slot.clone());
            current = if element.primitive().is_none() && element.widget().is_composite() {
                element.single_child()
            } else {
                None
            };
        }
    }
}
