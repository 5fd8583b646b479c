//! Primitive store that records every structural call it receives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use trellis_core::{place_child, Applier, AsAny, MemoryApplier, NodeError, Primitive, PrimitiveId};

/// Ordered, labelled primitive used by the test widgets.
#[derive(Debug, Default)]
pub struct TestPrimitive {
    pub label: String,
    pub children: Vec<PrimitiveId>,
    pub parent_data: Option<String>,
    pub mounted: bool,
    pub updates: usize,
}

impl TestPrimitive {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

impl Primitive for TestPrimitive {
    fn mount(&mut self) {
        self.mounted = true;
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }

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

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Create {
        id: PrimitiveId,
    },
    Insert {
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    },
    Move {
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    },
    Remove {
        parent: PrimitiveId,
        child: PrimitiveId,
    },
    Destroy {
        id: PrimitiveId,
    },
}

impl Mutation {
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Mutation::Insert { .. } | Mutation::Move { .. } | Mutation::Remove { .. }
        )
    }
}

#[derive(Default)]
struct LogState {
    entries: Vec<Mutation>,
    labels: HashMap<PrimitiveId, String>,
}

/// Shared view of the calls a [`RecordingApplier`] received.
#[derive(Clone, Default)]
pub struct MutationLog {
    state: Rc<RefCell<LogState>>,
}

impl MutationLog {
    pub fn entries(&self) -> Vec<Mutation> {
        self.state.borrow().entries.clone()
    }

    pub fn take(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.state.borrow_mut().entries)
    }

    pub fn clear(&self) {
        self.state.borrow_mut().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label the primitive was created with, kept after it is destroyed.
    pub fn label(&self, id: PrimitiveId) -> String {
        self.state
            .borrow()
            .labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Drains the log and renders each entry with primitive labels, e.g.
    /// `"move b after a"` or `"insert d first"`.
    pub fn take_described(&self) -> Vec<String> {
        self.take()
            .iter()
            .map(|mutation| self.describe(mutation))
            .collect()
    }

    pub fn describe(&self, mutation: &Mutation) -> String {
        let position = |after: &Option<PrimitiveId>| match after {
            Some(after) => format!("after {}", self.label(*after)),
            None => "first".to_string(),
        };
        match mutation {
            Mutation::Create { id } => format!("create {}", self.label(*id)),
            Mutation::Insert { child, after, .. } => {
                format!("insert {} {}", self.label(*child), position(after))
            }
            Mutation::Move { child, after, .. } => {
                format!("move {} {}", self.label(*child), position(after))
            }
            Mutation::Remove { child, .. } => format!("remove {}", self.label(*child)),
            Mutation::Destroy { id } => format!("destroy {}", self.label(*id)),
        }
    }

    fn push(&self, mutation: Mutation) {
        log::trace!("recorded {mutation:?}");
        self.state.borrow_mut().entries.push(mutation);
    }
}

impl fmt::Debug for MutationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}

/// [`MemoryApplier`] wrapper that appends every call to a [`MutationLog`].
#[derive(Default)]
pub struct RecordingApplier {
    inner: MemoryApplier,
    log: MutationLog,
}

impl RecordingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutationLog {
        self.log.clone()
    }

    pub fn memory(&mut self) -> &mut MemoryApplier {
        &mut self.inner
    }

    pub fn with_primitive<P: Primitive, R>(
        &mut self,
        id: PrimitiveId,
        f: impl FnOnce(&mut P) -> R,
    ) -> Result<R, NodeError> {
        self.inner.with_primitive(id, f)
    }
}

impl Applier for RecordingApplier {
    fn create(&mut self, primitive: Box<dyn Primitive>) -> PrimitiveId {
        let label = match (*primitive).as_any().downcast_ref::<TestPrimitive>() {
            Some(test) => test.label.clone(),
            None => (*primitive)
                .type_name()
                .rsplit("::")
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        let id = self.inner.create(primitive);
        self.log.state.borrow_mut().labels.insert(id, label);
        self.log.push(Mutation::Create { id });
        id
    }

    fn get_mut(&mut self, id: PrimitiveId) -> Result<&mut dyn Primitive, NodeError> {
        self.inner.get_mut(id)
    }

    fn remove(&mut self, id: PrimitiveId) -> Result<(), NodeError> {
        self.log.push(Mutation::Destroy { id });
        self.inner.remove(id)
    }

    fn insert_child(
        &mut self,
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    ) -> Result<(), NodeError> {
        self.log.push(Mutation::Insert {
            parent,
            child,
            after,
        });
        self.inner.insert_child(parent, child, after)
    }

    fn move_child(
        &mut self,
        parent: PrimitiveId,
        child: PrimitiveId,
        after: Option<PrimitiveId>,
    ) -> Result<(), NodeError> {
        self.log.push(Mutation::Move {
            parent,
            child,
            after,
        });
        self.inner.move_child(parent, child, after)
    }

    fn remove_child(&mut self, parent: PrimitiveId, child: PrimitiveId) -> Result<(), NodeError> {
        self.log.push(Mutation::Remove { parent, child });
        self.inner.remove_child(parent, child)
    }
}
