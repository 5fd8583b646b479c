//! Structural calls into the primitive tree.
//!
//! Failures here are logged and swallowed: a missing primitive means the
//! primitive tree was already torn down underneath the element, and the
//! element tree stays authoritative.

use crate::applier::{Applier, PrimitiveId};

pub(crate) fn insert(
    applier: &mut dyn Applier,
    parent: PrimitiveId,
    child: PrimitiveId,
    after: Option<PrimitiveId>,
) {
    log::trace!("insert primitive {child} into {parent} after {after:?}");
    if let Err(err) = applier.insert_child(parent, child, after) {
        log::warn!("insert of primitive {child} into {parent} failed: {err}");
    }
}

/// Moves `child` after `after` unless it already sits there.
///
/// Returns whether a move was issued.
pub(crate) fn relocate(
    applier: &mut dyn Applier,
    parent: PrimitiveId,
    child: PrimitiveId,
    after: Option<PrimitiveId>,
) -> bool {
    if let Ok(primitive) = applier.get_mut(parent) {
        let children = primitive.children();
        if let Some(position) = children.iter().position(|id| *id == child) {
            let current = position.checked_sub(1).map(|index| children[index]);
            if current == after {
                log::trace!("primitive {child} already follows {after:?} in {parent}");
                return false;
            }
        }
    }
    log::trace!("move primitive {child} in {parent} after {after:?}");
    if let Err(err) = applier.move_child(parent, child, after) {
        log::warn!("move of primitive {child} in {parent} failed: {err}");
    }
    true
}

pub(crate) fn remove(applier: &mut dyn Applier, parent: PrimitiveId, child: PrimitiveId) {
    log::trace!("remove primitive {child} from {parent}");
    if let Err(err) = applier.remove_child(parent, child) {
        log::warn!("removal of primitive {child} from {parent} failed: {err}");
    }
}

pub(crate) fn destroy(applier: &mut dyn Applier, id: PrimitiveId) {
    log::trace!("destroy primitive {id}");
    if let Ok(primitive) = applier.get_mut(id) {
        primitive.unmount();
    }
    if let Err(err) = applier.remove(id) {
        log::warn!("destroying primitive {id} failed: {err}");
    }
}

#[cfg(test)]
#[path = "tests/mutator_tests.rs"]
mod tests;
