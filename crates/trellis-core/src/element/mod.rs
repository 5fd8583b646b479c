//! Persistent nodes of the instance tree.
//!
//! An [`Element`] is created once per occupancy of a place in the tree and
//! survives any number of compatible configuration updates. Behaviour that
//! differs between configuration variants lives in a small strategy object
//! chosen when the element is created; everything else (lifecycle, slots,
//! depth, primitive attachment, inheritance) is shared and lives here.

mod component;
mod primitive;
mod reconcile;

use std::any::TypeId;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::applier::PrimitiveId;
use crate::collections::map::{HashMap, HashSet};
use crate::context::{BuildContext, ElementHandle, StateHandle};
use crate::error::{violation, BuildError, ErrorDetails, TreeError};
use crate::key::{GlobalKey, Key};
use crate::mutator;
use crate::owner::{BuildOwner, OwnerHandle};
use crate::resource::{ResourceLedger, TrackedResource};
use crate::widget::{PrimitiveChildren, State, Widget};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Initial,
    Active,
    Inactive,
    Defunct,
}

/// Position token a parent hands to a child.
///
/// Ordered parents use [`Slot::Indexed`], whose `previous` is the sibling
/// synced just before the child. Single-child parents use [`Slot::Single`].
#[derive(Clone, Default)]
pub enum Slot {
    #[default]
    Single,
    Indexed {
        index: usize,
        previous: Option<WeakElement>,
    },
}

impl Slot {
    pub(crate) fn indexed(index: usize, previous: Option<&Element>) -> Self {
        Slot::Indexed {
            index,
            previous: previous.map(Element::downgrade),
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Slot::Single => None,
            Slot::Indexed { index, .. } => Some(*index),
        }
    }

    pub fn previous(&self) -> Option<Element> {
        match self {
            Slot::Indexed {
                previous: Some(previous),
                ..
            } => previous.upgrade(),
            _ => None,
        }
    }

    /// Primitive the slot's owner must be placed after.
    fn after_primitive(&self) -> Option<PrimitiveId> {
        self.previous().and_then(|previous| previous.render_primitive())
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Slot::Single, Slot::Single) => true,
            (
                Slot::Indexed {
                    index: a,
                    previous: pa,
                },
                Slot::Indexed {
                    index: b,
                    previous: pb,
                },
            ) => {
                a == b
                    && match (pa, pb) {
                        (None, None) => true,
                        (Some(pa), Some(pb)) => pa.ptr_eq(pb),
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Single => f.write_str("Single"),
            Slot::Indexed { index, previous } => {
                let previous = previous.as_ref().and_then(WeakElement::upgrade);
                match previous {
                    Some(previous) => write!(f, "Indexed({index}, after {})", previous.id()),
                    None => write!(f, "Indexed({index}, first)"),
                }
            }
        }
    }
}

pub(crate) enum Children {
    Leaf,
    Single(Option<Element>),
    Multi(Vec<Element>),
}

type InheritedMap = Rc<HashMap<TypeId, WeakElement>>;

/// Per-variant element behaviour.
pub(crate) trait ElementBehavior {
    /// Runs once the element is attached and active.
    fn first_build(&self, element: &Element);

    /// Runs after the configuration was replaced by a compatible one.
    fn update(&self, element: &Element, old_widget: &Widget);

    /// Re-derives the element from its current configuration. Must clear the
    /// dirty flag.
    fn perform_rebuild(&self, element: &Element);

    fn did_change_dependencies(&self, element: &Element) {
        element.request_rebuild();
    }

    fn activate(&self, _element: &Element) {}

    fn deactivate(&self, _element: &Element) {}

    fn unmount(&self, _element: &Element) {}
}

struct ElementInner {
    id: ElementId,
    widget: RefCell<Widget>,
    behavior: &'static dyn ElementBehavior,
    parent: RefCell<Option<WeakElement>>,
    slot: RefCell<Slot>,
    depth: Cell<usize>,
    lifecycle: Cell<Lifecycle>,
    dirty: Cell<bool>,
    in_dirty_list: Cell<bool>,
    owner: RefCell<Option<OwnerHandle>>,
    children: RefCell<Children>,
    forgotten: RefCell<HashSet<ElementId>>,
    inherited: RefCell<Option<InheritedMap>>,
    had_unsatisfied_dependencies: Cell<bool>,
    dependencies_changed: Cell<bool>,
    primitive: Cell<Option<PrimitiveId>>,
    ancestor_primitive: RefCell<Option<WeakElement>>,
    state: Option<(TypeId, RefCell<Box<dyn State>>)>,
    resources: ResourceLedger,
}

#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

#[derive(Clone)]
pub struct WeakElement {
    inner: Weak<ElementInner>,
}

impl WeakElement {
    pub fn upgrade(&self) -> Option<Element> {
        self.inner.upgrade().map(|inner| Element { inner })
    }

    pub fn ptr_eq(&self, other: &WeakElement) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(element) => write!(f, "WeakElement({element})"),
            None => f.write_str("WeakElement(dropped)"),
        }
    }
}

fn behavior_for(widget: &Widget) -> &'static dyn ElementBehavior {
    match widget {
        Widget::Stateless(_) => &component::StatelessBehavior,
        Widget::Stateful(_) => &component::StatefulBehavior,
        Widget::Inherited(_) => &component::InheritedBehavior,
        Widget::Proxy(_) => &component::ProxyBehavior,
        Widget::Primitive(_) => &primitive::PrimitiveBehavior,
    }
}

impl Element {
    pub(crate) fn new(widget: Widget) -> Self {
        let state = match &widget {
            Widget::Stateful(stateful) => {
                let state = stateful.create_state();
                Some(((*state).as_any().type_id(), RefCell::new(state)))
            }
            _ => None,
        };
        let children = match &widget {
            Widget::Primitive(primitive) => match primitive.children() {
                PrimitiveChildren::Leaf => Children::Leaf,
                PrimitiveChildren::Single(_) => Children::Single(None),
                PrimitiveChildren::Multi(_) => Children::Multi(Vec::new()),
            },
            _ => Children::Single(None),
        };
        Self {
            inner: Rc::new(ElementInner {
                id: ElementId::next(),
                behavior: behavior_for(&widget),
                widget: RefCell::new(widget),
                parent: RefCell::new(None),
                slot: RefCell::new(Slot::Single),
                depth: Cell::new(0),
                lifecycle: Cell::new(Lifecycle::Initial),
                dirty: Cell::new(true),
                in_dirty_list: Cell::new(false),
                owner: RefCell::new(None),
                children: RefCell::new(children),
                forgotten: RefCell::new(HashSet::default()),
                inherited: RefCell::new(None),
                had_unsatisfied_dependencies: Cell::new(false),
                dependencies_changed: Cell::new(false),
                primitive: Cell::new(None),
                ancestor_primitive: RefCell::new(None),
                state,
                resources: ResourceLedger::default(),
            }),
        }
    }

    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    pub fn widget(&self) -> Widget {
        self.inner.widget.borrow().clone()
    }

    pub fn key(&self) -> Option<Key> {
        self.inner.widget.borrow().key().cloned()
    }

    pub fn global_key(&self) -> Option<GlobalKey> {
        self.inner
            .widget
            .borrow()
            .key()
            .and_then(Key::as_global)
            .cloned()
    }

    pub fn depth(&self) -> usize {
        self.inner.depth.get()
    }

    pub fn slot(&self) -> Slot {
        self.inner.slot.borrow().clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    pub fn parent(&self) -> Option<Element> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(WeakElement::upgrade)
    }

    pub fn owner(&self) -> Option<BuildOwner> {
        self.inner
            .owner
            .borrow()
            .as_ref()
            .and_then(OwnerHandle::upgrade)
    }

    /// Primitive owned by this element, if it is primitive-backed.
    pub fn primitive(&self) -> Option<PrimitiveId> {
        self.inner.primitive.get()
    }

    /// Nearest primitive at or below this element, following single-child
    /// composites down.
    pub fn render_primitive(&self) -> Option<PrimitiveId> {
        if let Some(id) = self.primitive() {
            return Some(id);
        }
        if self.widget().is_composite() {
            return self.single_child().and_then(|child| child.render_primitive());
        }
        None
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn handle(&self) -> ElementHandle {
        ElementHandle::new(self.downgrade())
    }

    /// Typed state handle, if this is a stateful element with state `S`.
    pub fn state_handle<S: State>(&self) -> Option<StateHandle<S>> {
        BuildContext::new(self).state_handle()
    }

    /// Current children in order, skipping any that were grafted elsewhere.
    pub fn children(&self) -> Vec<Element> {
        let forgotten = self.inner.forgotten.borrow();
        match &*self.inner.children.borrow() {
            Children::Leaf => Vec::new(),
            Children::Single(child) => child.iter().cloned().collect(),
            Children::Multi(children) => children
                .iter()
                .filter(|child| !forgotten.contains(&child.id()))
                .cloned()
                .collect(),
        }
    }

    pub fn visit_children(&self, mut visitor: impl FnMut(&Element)) {
        for child in self.children() {
            visitor(&child);
        }
    }

    /// Reads the state of a stateful element.
    ///
    /// Returns `None` for other variants, when `S` is not the state type, or
    /// while the state is mutably borrowed.
    pub fn with_state<S: State, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let state = self.state_ref::<S>()?;
        Some(f(&state))
    }

    pub fn mark_needs_build(&self) -> Result<(), TreeError> {
        match self.lifecycle() {
            Lifecycle::Active => {}
            Lifecycle::Defunct => {
                return Err(self.contract(TreeError::ElementDefunct {
                    element: self.to_string(),
                }))
            }
            Lifecycle::Initial | Lifecycle::Inactive => return Ok(()),
        }
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        owner.check_rebuild_request(self)?;
        if self.is_dirty() {
            return Ok(());
        }
        self.inner.dirty.set(true);
        owner.schedule_build_for(self);
        Ok(())
    }

    pub fn to_string_deep(&self) -> String {
        let mut output = String::new();
        self.write_deep(&mut output, 0);
        output
    }

    fn write_deep(&self, output: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(output, "{indent}{self}");
        if let Some(id) = self.primitive() {
            let _ = write!(output, " primitive={id}");
        }
        if self.is_dirty() {
            output.push_str(" dirty");
        }
        if self.lifecycle() != Lifecycle::Active {
            let _ = write!(output, " {:?}", self.lifecycle());
        }
        output.push('\n');
        for child in self.children() {
            child.write_deep(output, depth + 1);
        }
    }

    // ---- crate-internal accessors used by the owner and behaviours ----

    pub(crate) fn in_dirty_list(&self) -> bool {
        self.inner.in_dirty_list.get()
    }

    pub(crate) fn set_in_dirty_list(&self, value: bool) {
        self.inner.in_dirty_list.set(value);
    }

    pub(crate) fn clear_dirty(&self) {
        self.inner.dirty.set(false);
    }

    pub(crate) fn assign_owner(&self, owner: &BuildOwner) {
        *self.inner.owner.borrow_mut() = Some(owner.handle());
    }

    pub(crate) fn belongs_to(&self, owner: &BuildOwner) -> bool {
        self.inner
            .owner
            .borrow()
            .as_ref()
            .is_some_and(|handle| handle.is(owner))
    }

    pub(crate) fn single_child(&self) -> Option<Element> {
        match &*self.inner.children.borrow() {
            Children::Single(child) => child.clone(),
            _ => None,
        }
    }

    pub(crate) fn multi_children(&self) -> Vec<Element> {
        match &*self.inner.children.borrow() {
            Children::Multi(children) => children.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn set_children(&self, children: Children) {
        *self.inner.children.borrow_mut() = children;
    }

    pub(crate) fn is_forgotten(&self, child: &Element) -> bool {
        self.inner.forgotten.borrow().contains(&child.id())
    }

    pub(crate) fn clear_forgotten(&self) {
        self.inner.forgotten.borrow_mut().clear();
    }

    pub(crate) fn set_primitive(&self, id: Option<PrimitiveId>) {
        self.inner.primitive.set(id);
    }

    pub(crate) fn take_dependencies_changed(&self) -> bool {
        self.inner.dependencies_changed.replace(false)
    }

    pub(crate) fn set_dependencies_changed(&self) {
        self.inner.dependencies_changed.set(true);
    }

    pub(crate) fn track_resource(&self, label: Rc<str>) -> TrackedResource {
        self.inner.resources.track(label)
    }

    pub(crate) fn state_type(&self) -> Option<TypeId> {
        self.inner.state.as_ref().map(|(type_id, _)| *type_id)
    }

    pub(crate) fn state_cell(&self) -> Option<&RefCell<Box<dyn State>>> {
        self.inner.state.as_ref().map(|(_, cell)| cell)
    }

    pub(crate) fn state_ref<S: State>(&self) -> Option<Ref<'_, S>> {
        let cell = self.state_cell()?;
        let state = cell.try_borrow().ok()?;
        Ref::filter_map(state, |state| (**state).as_any().downcast_ref::<S>()).ok()
    }

    pub(crate) fn with_state_mut<S: State, R>(
        &self,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<Option<R>, TreeError> {
        let Some(cell) = self.state_cell() else {
            return Ok(None);
        };
        let state = cell.try_borrow_mut().map_err(|_| TreeError::StateBusy)?;
        let typed = RefMut::filter_map(state, |state| (**state).as_any_mut().downcast_mut::<S>());
        Ok(typed.ok().map(|mut state| f(&mut state)))
    }

    /// Looks up the nearest inherited ancestor of the given configuration
    /// type, optionally subscribing to it.
    pub(crate) fn inherited_ancestor(&self, type_id: TypeId, subscribe: bool) -> Option<Element> {
        let ancestor = self
            .inner
            .inherited
            .borrow()
            .as_ref()
            .and_then(|map| map.get(&type_id).and_then(WeakElement::upgrade));
        match (&ancestor, subscribe) {
            (Some(ancestor), true) => {
                if let Some(owner) = self.owner() {
                    owner.add_dependency(self, ancestor);
                }
            }
            (None, true) => self.inner.had_unsatisfied_dependencies.set(true),
            _ => {}
        }
        ancestor
    }

    pub(crate) fn is_self_or_descendant_of(&self, ancestor: &Element) -> bool {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if element.ptr_eq(ancestor) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// Applies the contract-violation policy of this element's owner.
    pub(crate) fn contract(&self, error: TreeError) -> TreeError {
        let strict = self
            .owner()
            .map_or(cfg!(debug_assertions), |owner| owner.options().strict_contracts);
        violation(strict, error)
    }

    /// Marks the element dirty on behalf of the framework.
    pub(crate) fn request_rebuild(&self) {
        if let Err(err) = self.mark_needs_build() {
            log::warn!("rebuild request for {self} dropped: {err}");
        }
    }

    /// Runs a user hook, containing and reporting a panic.
    pub(crate) fn guard_user_code(&self, hook: &str, f: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            self.report(format!("running {hook} of {self}"), BuildError::from_panic(payload));
        }
    }

    pub(crate) fn report(&self, context: String, error: BuildError) -> ErrorDetails {
        let details = ErrorDetails::new(context, error);
        match self.owner() {
            Some(owner) => owner.report(&details),
            None => log::error!("{details}"),
        }
        details
    }

    // ---- lifecycle ----

    pub(crate) fn mount(&self, parent: Option<&Element>, slot: Slot) {
        if self.lifecycle() != Lifecycle::Initial {
            self.contract(TreeError::InvalidLifecycle {
                element: self.to_string(),
                expected: Lifecycle::Initial,
                actual: self.lifecycle(),
            });
            return;
        }
        if let Some(parent) = parent {
            *self.inner.parent.borrow_mut() = Some(parent.downgrade());
            self.inner.depth.set(parent.depth() + 1);
            let owner = parent.inner.owner.borrow().clone();
            *self.inner.owner.borrow_mut() = owner;
        }
        *self.inner.slot.borrow_mut() = slot;
        self.inner.lifecycle.set(Lifecycle::Active);
        if let (Some(key), Some(owner)) = (self.global_key(), self.owner()) {
            owner.register_global_key(&key, self);
        }
        self.update_inheritance();
        log::trace!("mount {self} at depth {}", self.depth());
        self.inner.behavior.first_build(self);
    }

    pub(crate) fn update(&self, widget: Widget) {
        if self.lifecycle() != Lifecycle::Active {
            self.contract(TreeError::InvalidLifecycle {
                element: self.to_string(),
                expected: Lifecycle::Active,
                actual: self.lifecycle(),
            });
            return;
        }
        let compatible = self.inner.widget.borrow().can_update(&widget);
        if !compatible {
            self.contract(TreeError::IncompatibleUpdate {
                current: self.to_string(),
                new: format!("{widget:?}"),
            });
            return;
        }
        let old_widget = self.inner.widget.replace(widget);
        log::trace!("update {self}");
        self.inner.behavior.update(self, &old_widget);
    }

    /// Rebuilds the element if it is active and dirty, or unconditionally
    /// when `force` is set.
    pub(crate) fn rebuild(&self, force: bool) {
        if self.lifecycle() != Lifecycle::Active || (!self.is_dirty() && !force) {
            return;
        }
        log::trace!("rebuild {self}");
        self.inner.behavior.perform_rebuild(self);
    }

    pub(crate) fn deactivate_recursively(&self) {
        self.deactivate();
        for child in self.children() {
            child.deactivate_recursively();
        }
    }

    fn deactivate(&self) {
        self.inner.behavior.deactivate(self);
        if let Some(owner) = self.owner() {
            owner.detach_dependencies(self);
        }
        *self.inner.inherited.borrow_mut() = None;
        self.inner.lifecycle.set(Lifecycle::Inactive);
        log::trace!("deactivate {self}");
    }

    pub(crate) fn activate_with_parent(&self, parent: &Element, slot: Slot) {
        if self.lifecycle() != Lifecycle::Inactive {
            self.contract(TreeError::InvalidLifecycle {
                element: self.to_string(),
                expected: Lifecycle::Inactive,
                actual: self.lifecycle(),
            });
            return;
        }
        *self.inner.parent.borrow_mut() = Some(parent.downgrade());
        self.update_depth(parent.depth());
        self.activate_recursively();
        self.attach_primitive(slot);
    }

    fn activate_recursively(&self) {
        self.activate();
        for child in self.children() {
            child.activate_recursively();
        }
    }

    fn activate(&self) {
        let owner = self.owner();
        let had_dependencies = self.inner.had_unsatisfied_dependencies.replace(false)
            | owner
                .as_ref()
                .is_some_and(|owner| owner.clear_dependencies(self));
        self.inner.lifecycle.set(Lifecycle::Active);
        self.update_inheritance();
        log::trace!("activate {self}");
        if self.is_dirty() {
            if let Some(owner) = &owner {
                owner.schedule_build_for(self);
            }
        }
        if had_dependencies {
            self.did_change_dependencies();
        }
        self.inner.behavior.activate(self);
    }

    pub(crate) fn did_change_dependencies(&self) {
        self.inner.behavior.did_change_dependencies(self);
    }

    pub(crate) fn unmount(&self) {
        if self.lifecycle() != Lifecycle::Inactive {
            self.contract(TreeError::InvalidLifecycle {
                element: self.to_string(),
                expected: Lifecycle::Inactive,
                actual: self.lifecycle(),
            });
            return;
        }
        let owner = self.owner();
        if let (Some(key), Some(owner)) = (self.global_key(), &owner) {
            owner.unregister_global_key(&key, self);
        }
        self.inner.behavior.unmount(self);
        if let Some(owner) = &owner {
            owner.clear_dependencies(self);
            if owner.options().debug_checks {
                for label in self.inner.resources.take_leaked() {
                    self.report(
                        format!("disposing {self}"),
                        BuildError::LeakedResource {
                            element: self.to_string(),
                            label,
                        },
                    );
                }
            }
        }
        self.inner.lifecycle.set(Lifecycle::Defunct);
        log::trace!("unmount {self}");
    }

    fn update_inheritance(&self) {
        let base = self
            .parent()
            .and_then(|parent| parent.inner.inherited.borrow().clone());
        let widget = self.widget();
        let map = match widget {
            Widget::Inherited(_) => {
                let mut map = base.as_deref().cloned().unwrap_or_default();
                map.insert(widget.concrete_type(), self.downgrade());
                Some(Rc::new(map))
            }
            _ => base,
        };
        *self.inner.inherited.borrow_mut() = map;
    }

    fn update_depth(&self, parent_depth: usize) {
        let expected = parent_depth + 1;
        if self.depth() < expected {
            self.inner.depth.set(expected);
            for child in self.children() {
                child.update_depth(expected);
            }
        }
    }

    // ---- primitive attachment ----

    fn find_ancestor_primitive_element(&self) -> Option<Element> {
        let mut current = self.parent();
        while let Some(element) = current {
            if element.primitive().is_some() {
                return Some(element);
            }
            current = element.parent();
        }
        None
    }

    /// Inserts this element's primitive, or those of its nearest primitive
    /// descendants, into the ancestor primitive at `slot`.
    pub(crate) fn attach_primitive(&self, slot: Slot) {
        *self.inner.slot.borrow_mut() = slot.clone();
        let Some(id) = self.primitive() else {
            for child in self.children() {
                child.attach_primitive(slot.clone());
            }
            return;
        };
        let ancestor = self.find_ancestor_primitive_element();
        *self.inner.ancestor_primitive.borrow_mut() = ancestor.as_ref().map(Element::downgrade);
        let Some(owner) = self.owner() else {
            return;
        };
        if let Some(parent_id) = ancestor.as_ref().and_then(Element::primitive) {
            let after = slot.after_primitive();
            owner.with_applier_mut(|applier| mutator::insert(applier, parent_id, id, after));
        }
        self.apply_ancestor_parent_data(&owner, id);
    }

    pub(crate) fn detach_primitive(&self) {
        let Some(id) = self.primitive() else {
            for child in self.children() {
                child.detach_primitive();
            }
            return;
        };
        let ancestor = self
            .inner
            .ancestor_primitive
            .take()
            .and_then(|ancestor| ancestor.upgrade());
        let parent_id = ancestor.as_ref().and_then(Element::primitive);
        if let (Some(parent_id), Some(owner)) = (parent_id, self.owner()) {
            owner.with_applier_mut(|applier| mutator::remove(applier, parent_id, id));
        }
    }

    /// Records a new slot, moving the primitive if this element owns one.
    pub(crate) fn update_slot(&self, slot: Slot) {
        *self.inner.slot.borrow_mut() = slot.clone();
        let Some(id) = self.primitive() else {
            return;
        };
        let ancestor = self
            .inner
            .ancestor_primitive
            .borrow()
            .as_ref()
            .and_then(WeakElement::upgrade);
        let parent_id = ancestor.as_ref().and_then(Element::primitive);
        if let (Some(parent_id), Some(owner)) = (parent_id, self.owner()) {
            let after = slot.after_primitive();
            owner.with_applier_mut(|applier| mutator::relocate(applier, parent_id, id, after));
        }
    }

    /// Pushes parent data from every proxy between this element and its
    /// ancestor primitive onto `id`, innermost last.
    fn apply_ancestor_parent_data(&self, owner: &BuildOwner, id: PrimitiveId) {
        let mut proxies = Vec::new();
        let mut current = self.parent();
        while let Some(element) = current {
            if element.primitive().is_some() {
                break;
            }
            if let Widget::Proxy(proxy) = element.widget() {
                proxies.push(proxy);
            }
            current = element.parent();
        }
        if proxies.is_empty() {
            return;
        }
        owner.with_primitive_mut(id, |primitive| {
            for proxy in proxies.iter().rev() {
                proxy.apply_parent_data(primitive);
            }
        });
    }

    /// Pushes this proxy's parent data onto its nearest primitive
    /// descendants.
    pub(crate) fn apply_parent_data_to_descendants(&self) {
        let Widget::Proxy(proxy) = self.widget() else {
            return;
        };
        let Some(owner) = self.owner() else {
            return;
        };
        let mut pending = self.children();
        while let Some(element) = pending.pop() {
            match element.primitive() {
                Some(id) => owner.with_primitive_mut(id, |primitive| proxy.apply_parent_data(primitive)),
                None => pending.extend(element.children()),
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.widget.try_borrow() {
            Ok(widget) => write!(f, "{widget:?}{}", self.id()),
            Err(_) => write!(f, "Element{}", self.id()),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id())
            .field("widget", &format_args!("{self}"))
            .field("depth", &self.depth())
            .field("lifecycle", &self.lifecycle())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
