//! Backing primitive store.
//!
//! Elements that own a primitive never hold it directly; they hold a
//! [`PrimitiveId`] into an [`Applier`] owned by the build owner. The applier
//! is the seam to the layout/paint layer: the core only ever creates,
//! updates, re-parents and destroys primitives through it.

use std::fmt::Write as _;

use crate::error::NodeError;
use crate::widget::AsAny;

pub type PrimitiveId = usize;

/// Mutable layout/paint object owned by a primitive-backed element.
///
/// `after` in the structural hooks is the sibling the child must follow, or
/// `None` when the child goes first.
pub trait Primitive: AsAny {
    fn mount(&mut self) {}
    fn update(&mut self) {}
    fn unmount(&mut self) {}
    fn insert_child(&mut self, _child: PrimitiveId, _after: Option<PrimitiveId>) {}
    fn move_child(&mut self, _child: PrimitiveId, _after: Option<PrimitiveId>) {}
    fn remove_child(&mut self, _child: PrimitiveId) {}
    fn children(&self) -> Vec<PrimitiveId> {
        Vec::new()
    }
}

pub trait Applier: AsAny {
    fn create(&mut self, primitive: Box<dyn Primitive>) -> PrimitiveId;

    fn get_mut(&mut self, id: PrimitiveId) -> Result<&mut dyn Primitive, NodeError>;

    /// Destroys a single primitive. Children are destroyed by their own
    /// elements before their parent.
    fn remove(&mut self, id: PrimitiveId) -> Result<(), NodeError>;

    fn insert_child(
        &mut self,
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    ) -> Result<(), NodeError> {
        self.get_mut(parent)?.insert_child(child, after);
        Ok(())
    }

    fn move_child(
        &mut self,
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    ) -> Result<(), NodeError> {
        self.get_mut(parent)?.move_child(child, after);
        Ok(())
    }

    fn remove_child(&mut self, parent: PrimitiveId, child: PrimitiveId) -> Result<(), NodeError> {
        self.get_mut(parent)?.remove_child(child);
        Ok(())
    }
}

/// Places `child` directly after `after` in an ordered child list, removing
/// any earlier occurrence first. An unknown `after` appends.
pub fn place_child(children: &mut Vec<PrimitiveId>, child: PrimitiveId, after: Option<PrimitiveId>) {
    children.retain(|existing| *existing != child);
    let index = match after {
        None => 0,
        Some(after) => children
            .iter()
            .position(|existing| *existing == after)
            .map_or(children.len(), |position| position + 1),
    };
    children.insert(index, child);
}

#[derive(Default)]
pub struct MemoryApplier {
    primitives: Vec<Option<Box<dyn Primitive>>>,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self {
            primitives: Vec::new(),
        }
    }

    pub fn with_primitive<P: Primitive, R>(
        &mut self,
        id: PrimitiveId,
        f: impl FnOnce(&mut P) -> R,
    ) -> Result<R, NodeError> {
        let primitive = self.get_mut(id)?;
        let typed = primitive
            .as_any_mut()
            .downcast_mut::<P>()
            .ok_or(NodeError::TypeMismatch {
                id,
                expected: std::any::type_name::<P>(),
            })?;
        Ok(f(typed))
    }

    /// Number of live primitives.
    pub fn len(&self) -> usize {
        self.primitives.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        matches!(self.primitives.get(id), Some(Some(_)))
    }

    pub fn dump_tree(&self, root: Option<PrimitiveId>) -> String {
        let mut output = String::new();
        match root {
            Some(root) => self.dump_primitive(&mut output, root, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_primitive(&self, output: &mut String, id: PrimitiveId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.primitives.get(id) {
            Some(Some(primitive)) => {
                let _ = writeln!(output, "{indent}[{id}] {}", (**primitive).type_name());
                for child in primitive.children() {
                    self.dump_primitive(output, child, depth + 1);
                }
            }
            _ => {
                let _ = writeln!(output, "{indent}[{id}] (missing)");
            }
        }
    }
}

impl Applier for MemoryApplier {
    fn create(&mut self, primitive: Box<dyn Primitive>) -> PrimitiveId {
        let id = self.primitives.len();
        self.primitives.push(Some(primitive));
        id
    }

    fn get_mut(&mut self, id: PrimitiveId) -> Result<&mut dyn Primitive, NodeError> {
        let slot = self
            .primitives
            .get_mut(id)
            .ok_or(NodeError::Missing { id })?
            .as_deref_mut()
            .ok_or(NodeError::Missing { id })?;
        Ok(slot)
    }

    fn remove(&mut self, id: PrimitiveId) -> Result<(), NodeError> {
        self.primitives
            .get_mut(id)
            .and_then(Option::take)
            .map(|_| ())
            .ok_or(NodeError::Missing { id })
    }
}

/// Primitive backing the root of an element tree.
#[derive(Debug, Default)]
pub struct RootPrimitive {
    children: Vec<PrimitiveId>,
}

impl Primitive for RootPrimitive {
    fn insert_child(&mut self, child: PrimitiveId, after: Option<PrimitiveId>) {
        place_child(&mut self.children, child, after);
    }

    fn move_child(&mut self, child: PrimitiveId, after: Option<PrimitiveId>) {
        place_child(&mut self.children, child, after);
    }

    fn remove_child(&mut self, child: PrimitiveId) {
        self.children.retain(|existing| *existing != child);
    }

    fn children(&self) -> Vec<PrimitiveId> {
        self.children.clone()
    }
}

#[cfg(test)]
#[path = "tests/applier_tests.rs"]
mod tests;
