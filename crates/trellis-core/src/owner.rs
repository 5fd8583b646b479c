//! Build owner: the dirty-set scheduler of one element tree.
//!
//! The owner holds everything that is shared by the elements of a tree: the
//! primitive store, the dirty list, the inactive list, the global key table
//! and the dependency graph. Elements reach it through a weak handle that
//! they inherit from their parent when mounted.
//!
//! A pass has two phases. [`BuildOwner::build_scope`] rebuilds dirty
//! elements in depth order; elements removed from the tree while it runs
//! stay inactive and may still be reclaimed through their global key.
//! [`BuildOwner::finalize_tree`] then unmounts whatever is still inactive.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::applier::{Applier, Primitive, PrimitiveId};
use crate::dependencies::DependencyGraph;
use crate::element::{Element, Lifecycle};
use crate::error::{violation, ErrorDetails, ErrorReporter, LogReporter, TreeError};
use crate::inactive::InactiveElements;
use crate::key::GlobalKey;
use crate::platform::{BuildScheduler, NoopScheduler};
use crate::registry::GlobalKeyRegistry;
use crate::widget::{ErrorWidget, Widget};

pub type ErrorWidgetBuilder = Rc<dyn Fn(&ErrorDetails) -> Widget>;

/// Construction-time settings of a [`BuildOwner`].
#[derive(Clone)]
pub struct OwnerOptions {
    pub scheduler: Arc<dyn BuildScheduler>,
    pub reporter: Rc<dyn ErrorReporter>,
    pub error_widget: ErrorWidgetBuilder,
    /// Panic on contract violations instead of logging and skipping.
    pub strict_contracts: bool,
    /// Enables duplicate global key, missed dirty element and resource leak
    /// checks.
    pub debug_checks: bool,
}

impl OwnerOptions {
    pub fn new() -> Self {
        Self {
            scheduler: Arc::new(NoopScheduler),
            reporter: Rc::new(LogReporter),
            error_widget: Rc::new(|details| Widget::primitive(ErrorWidget::from_details(details))),
            strict_contracts: cfg!(debug_assertions),
            debug_checks: cfg!(debug_assertions),
        }
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn BuildScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn reporter(mut self, reporter: Rc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn error_widget(mut self, builder: impl Fn(&ErrorDetails) -> Widget + 'static) -> Self {
        self.error_widget = Rc::new(builder);
        self
    }

    pub fn strict_contracts(mut self, strict: bool) -> Self {
        self.strict_contracts = strict;
        self
    }

    pub fn debug_checks(mut self, enabled: bool) -> Self {
        self.debug_checks = enabled;
        self
    }
}

impl Default for OwnerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OwnerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerOptions")
            .field("strict_contracts", &self.strict_contracts)
            .field("debug_checks", &self.debug_checks)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type KeyRemovedListener = Rc<dyn Fn(&GlobalKey)>;

#[derive(Default)]
struct PassContext {
    id: u64,
    target: Option<Element>,
}

struct OwnerInner {
    applier: RefCell<Box<dyn Applier>>,
    options: OwnerOptions,
    dirty: RefCell<Vec<Element>>,
    needs_resorting: Cell<bool>,
    build_scheduled: Cell<bool>,
    building: Cell<bool>,
    pass: RefCell<PassContext>,
    inactive: RefCell<InactiveElements>,
    registry: RefCell<GlobalKeyRegistry>,
    dependencies: RefCell<DependencyGraph>,
    lock_depth: Cell<usize>,
    tasks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    key_listeners: RefCell<Vec<(ListenerId, KeyRemovedListener)>>,
    next_listener: Cell<u64>,
}

#[derive(Clone)]
pub struct BuildOwner {
    inner: Rc<OwnerInner>,
}

/// Non-owning reference from an element to its owner.
#[derive(Clone)]
pub(crate) struct OwnerHandle(Weak<OwnerInner>);

impl OwnerHandle {
    pub(crate) fn upgrade(&self) -> Option<BuildOwner> {
        self.0.upgrade().map(|inner| BuildOwner { inner })
    }

    pub(crate) fn is(&self, owner: &BuildOwner) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&owner.inner))
    }
}

/// Closes the build scope even if a rebuild unwinds.
struct ScopeGuard<'a> {
    inner: &'a OwnerInner,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        for element in self.inner.dirty.take() {
            element.set_in_dirty_list(false);
        }
        let mut pass = self.inner.pass.borrow_mut();
        pass.target = None;
        self.inner.needs_resorting.set(false);
        self.inner.build_scheduled.set(false);
        self.inner.building.set(false);
    }
}

struct LockGuard<'a>(&'a Cell<usize>);

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// Dirty-first within a depth, shallower depths first.
fn sort_dirty(elements: &mut [Element]) {
    elements.sort_by(|a, b| {
        a.depth()
            .cmp(&b.depth())
            .then_with(|| b.is_dirty().cmp(&a.is_dirty()))
    });
}

impl BuildOwner {
    pub fn new(applier: impl Applier) -> Self {
        Self::with_options(applier, OwnerOptions::default())
    }

    pub fn with_options(applier: impl Applier, options: OwnerOptions) -> Self {
        Self {
            inner: Rc::new(OwnerInner {
                applier: RefCell::new(Box::new(applier)),
                options,
                dirty: RefCell::new(Vec::new()),
                needs_resorting: Cell::new(false),
                build_scheduled: Cell::new(false),
                building: Cell::new(false),
                pass: RefCell::new(PassContext::default()),
                inactive: RefCell::new(InactiveElements::default()),
                registry: RefCell::new(GlobalKeyRegistry::default()),
                dependencies: RefCell::new(DependencyGraph::default()),
                lock_depth: Cell::new(0),
                tasks: RefCell::new(VecDeque::new()),
                key_listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(1),
            }),
        }
    }

    pub fn options(&self) -> &OwnerOptions {
        &self.inner.options
    }

    /// Creates an unmounted root element bound to this owner. Mount it with
    /// [`Self::mount_root`].
    pub fn create_root(&self, widget: Widget) -> Element {
        let root = Element::new(widget);
        root.assign_owner(self);
        root
    }

    pub fn mount_root(&self, root: &Element) -> Result<(), TreeError> {
        if root.lifecycle() != Lifecycle::Initial {
            return Err(self.violation(TreeError::InvalidLifecycle {
                element: root.to_string(),
                expected: Lifecycle::Initial,
                actual: root.lifecycle(),
            }));
        }
        let target = root.clone();
        self.build_scope_with(root, move || target.mount(None, Default::default()))
    }

    /// Replaces the configuration of a mounted root within a build scope.
    pub fn update_root(&self, root: &Element, widget: Widget) -> Result<(), TreeError> {
        let target = root.clone();
        self.build_scope_with(root, move || target.update(widget))
    }

    pub fn is_building(&self) -> bool {
        self.inner.building.get()
    }

    /// Monotonic id of the current (or last) build pass.
    pub fn pass_id(&self) -> u64 {
        self.inner.pass.borrow().id
    }

    pub fn dirty_count(&self) -> usize {
        self.inner.dirty.borrow().len()
    }

    pub fn needs_build(&self) -> bool {
        self.inner.dirty.borrow().iter().any(Element::is_dirty)
    }

    pub fn inactive_count(&self) -> usize {
        self.inner.inactive.borrow().len()
    }

    pub fn is_inactive(&self, element: &Element) -> bool {
        self.inner.inactive.borrow().contains(element)
    }

    pub fn global_key_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    /// Element currently registered under `key`.
    pub fn global_key_element(&self, key: &GlobalKey) -> Option<Element> {
        self.inner.registry.borrow().lookup(key)
    }

    /// Runs `f` against the primitive store if it is an `A`.
    pub fn with_applier<A: Applier, R>(&self, f: impl FnOnce(&mut A) -> R) -> Option<R> {
        let mut guard = self.inner.applier.borrow_mut();
        let applier: &mut dyn Applier = &mut **guard;
        applier.as_any_mut().downcast_mut::<A>().map(f)
    }

    pub(crate) fn with_applier_mut<R>(&self, f: impl FnOnce(&mut dyn Applier) -> R) -> R {
        let mut guard = self.inner.applier.borrow_mut();
        f(&mut **guard)
    }

    pub(crate) fn with_primitive_mut(&self, id: PrimitiveId, f: impl FnOnce(&mut dyn Primitive)) {
        self.with_applier_mut(|applier| match applier.get_mut(id) {
            Ok(primitive) => f(primitive),
            Err(err) => log::warn!("{err}"),
        });
    }

    // ---- dirty set ----

    /// Adds `element` to the dirty list, notifying the host once per
    /// pending pass.
    pub(crate) fn schedule_build_for(&self, element: &Element) {
        if element.in_dirty_list() {
            self.inner.needs_resorting.set(true);
            return;
        }
        if !self.inner.build_scheduled.replace(true) {
            log::trace!("build scheduled by {element}");
            self.inner.options.scheduler.on_build_scheduled();
        }
        element.set_in_dirty_list(true);
        self.inner.dirty.borrow_mut().push(element.clone());
    }

    /// Validates a rebuild request for an active element.
    pub(crate) fn check_rebuild_request(&self, element: &Element) -> Result<(), TreeError> {
        if self.inner.building.get() {
            let target = self.inner.pass.borrow().target.clone();
            if let Some(target) = target {
                if !element.is_self_or_descendant_of(&target) {
                    let error = self.violation(TreeError::RebuildOutsideBuildTarget {
                        element: element.to_string(),
                        target: target.to_string(),
                    });
                    log::debug!("tolerating: {error}");
                }
            }
        } else if self.inner.lock_depth.get() > 0 {
            return Err(self.violation(TreeError::StateLocked {
                element: element.to_string(),
            }));
        }
        Ok(())
    }

    pub fn build_scope(&self, root: &Element) -> Result<(), TreeError> {
        self.run_scope(root, None::<fn()>)
    }

    /// Opens a build scope, runs `callback` inside it, then rebuilds every
    /// dirty element.
    pub fn build_scope_with(&self, root: &Element, callback: impl FnOnce()) -> Result<(), TreeError> {
        self.run_scope(root, Some(callback))
    }

    fn run_scope<F: FnOnce()>(&self, root: &Element, callback: Option<F>) -> Result<(), TreeError> {
        if self.inner.building.get() {
            return Err(self.violation(TreeError::ReentrantBuildScope));
        }
        if !root.belongs_to(self) {
            return Err(self.violation(TreeError::OutOfBuildScope {
                element: root.to_string(),
            }));
        }
        if callback.is_none() && self.inner.dirty.borrow().is_empty() {
            return Ok(());
        }

        self.inner.building.set(true);
        self.inner.build_scheduled.set(true);
        {
            let mut pass = self.inner.pass.borrow_mut();
            pass.id += 1;
            pass.target = Some(root.clone());
        }
        let guard = ScopeGuard { inner: &self.inner };

        if let Some(callback) = callback {
            self.inner.needs_resorting.set(false);
            callback();
        }
        let (rebuilt, missed) = self.flush_dirty_elements();
        drop(guard);

        log::debug!("build pass {}: rebuilt {rebuilt} element(s)", self.pass_id());
        if missed.is_empty() {
            return Ok(());
        }
        let error = self.violation(TreeError::DirtyElementsMissed {
            count: missed.len(),
        });
        for element in &missed {
            self.schedule_build_for(element);
        }
        Err(error)
    }

    /// Drains the dirty list in depth order. Returns the number of rebuilds
    /// and any active element left dirty.
    fn flush_dirty_elements(&self) -> (usize, Vec<Element>) {
        sort_dirty(&mut self.inner.dirty.borrow_mut());
        self.inner.needs_resorting.set(false);
        let mut dirty_count = self.inner.dirty.borrow().len();
        let mut index = 0;
        let mut rebuilt = 0;
        let mut building_depth = 0;
        while index < dirty_count {
            let element = self.inner.dirty.borrow()[index].clone();
            if element.is_active() && element.is_dirty() {
                if element.depth() < building_depth {
                    let error = self.violation(TreeError::MalformedPass {
                        element: element.to_string(),
                        depth: element.depth(),
                        building: building_depth,
                    });
                    log::debug!("continuing after {error}");
                }
                building_depth = element.depth();
                self.inner.pass.borrow_mut().target = Some(element.clone());
                element.rebuild(false);
                rebuilt += 1;
            }
            index += 1;
            let len = self.inner.dirty.borrow().len();
            if dirty_count < len || self.inner.needs_resorting.get() {
                let mut dirty = self.inner.dirty.borrow_mut();
                sort_dirty(&mut dirty);
                self.inner.needs_resorting.set(false);
                dirty_count = dirty.len();
                while index > 0 && dirty[index - 1].is_dirty() {
                    index -= 1;
                }
            }
        }

        let missed = if self.inner.options.debug_checks {
            self.inner
                .dirty
                .borrow()
                .iter()
                .filter(|element| element.is_active() && element.is_dirty())
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        (rebuilt, missed)
    }

    /// Unmounts every element still inactive, then queues global key
    /// removal notifications.
    pub fn finalize_tree(&self) -> Result<(), TreeError> {
        let unmounted = self.lock_state(|| self.unmount_inactive());
        let removed = self.inner.registry.borrow_mut().take_removed();
        if !removed.is_empty() {
            let owner = Rc::downgrade(&self.inner);
            self.spawn_task(move || {
                let Some(inner) = owner.upgrade() else {
                    return;
                };
                let listeners: Vec<KeyRemovedListener> = inner
                    .key_listeners
                    .borrow()
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect();
                for key in &removed {
                    for listener in &listeners {
                        listener(key);
                    }
                }
            });
        }
        log::debug!("finalized tree: unmounted {unmounted} element(s)");

        let duplicates = self.inner.registry.borrow_mut().take_duplicates();
        if self.inner.options.debug_checks && !duplicates.is_empty() {
            let error = TreeError::DuplicateGlobalKeys { keys: duplicates };
            log::error!("{error}");
            return Err(error);
        }
        Ok(())
    }

    fn unmount_inactive(&self) -> usize {
        let elements = self.inner.inactive.borrow_mut().take_deepest_first();
        elements.iter().map(unmount_subtree).sum()
    }

    /// Runs `f` with rebuild requests from outside a build scope rejected.
    pub fn lock_state<R>(&self, f: impl FnOnce() -> R) -> R {
        let depth = &self.inner.lock_depth;
        depth.set(depth.get() + 1);
        let _guard = LockGuard(depth);
        f()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.lock_depth.get() > 0
    }

    // ---- deferred tasks ----

    /// Queues `task` to run after the current pass, on the next
    /// [`Self::drain_tasks`].
    pub fn spawn_task(&self, task: impl FnOnce() + 'static) {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Runs queued tasks, including any queued while draining. Returns how
    /// many ran.
    pub fn drain_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.inner.tasks.borrow_mut().pop_front();
            let Some(task) = task else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn add_global_key_removed_listener(&self, listener: impl Fn(&GlobalKey) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner
            .key_listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn remove_global_key_removed_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.key_listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    // ---- element support ----

    pub(crate) fn handle(&self) -> OwnerHandle {
        OwnerHandle(Rc::downgrade(&self.inner))
    }

    pub(crate) fn violation(&self, error: TreeError) -> TreeError {
        violation(self.inner.options.strict_contracts, error)
    }

    pub(crate) fn report(&self, details: &ErrorDetails) {
        self.inner.options.reporter.report(details);
    }

    pub(crate) fn error_widget(&self, details: &ErrorDetails) -> Widget {
        (self.inner.options.error_widget)(details)
    }

    pub(crate) fn deactivate_into_inactive(&self, element: &Element) {
        if element.is_active() {
            element.deactivate_recursively();
        }
        self.inner.inactive.borrow_mut().add(element.clone());
    }

    /// Detaches the element registered under `key` so it can be re-mounted
    /// under `new_parent`.
    pub(crate) fn retake(
        &self,
        key: &GlobalKey,
        widget: &Widget,
        new_parent: &Element,
    ) -> Result<Option<Element>, TreeError> {
        let Some(element) = self.global_key_element(key) else {
            return Ok(None);
        };
        if element.lifecycle() == Lifecycle::Defunct || !element.widget().can_update(widget) {
            return Ok(None);
        }
        if new_parent.is_self_or_descendant_of(&element) {
            return Err(self.violation(TreeError::GraftIntoDescendant {
                key: key.to_string(),
            }));
        }
        let parent = element.parent();
        if element.is_active() && parent.as_ref().is_some_and(|parent| parent.ptr_eq(new_parent)) {
            log::warn!("{key} appears twice under {new_parent}");
            return Ok(None);
        }
        if let Some(parent) = parent {
            parent.forget_child(&element);
            parent.deactivate_child(&element);
        }
        self.inner.inactive.borrow_mut().remove(&element);
        Ok(Some(element))
    }

    pub(crate) fn register_global_key(&self, key: &GlobalKey, element: &Element) {
        self.inner.registry.borrow_mut().register(key, element);
    }

    pub(crate) fn unregister_global_key(&self, key: &GlobalKey, element: &Element) {
        self.inner.registry.borrow_mut().unregister(key, element);
    }

    pub(crate) fn add_dependency(&self, subscriber: &Element, producer: &Element) {
        self.inner.dependencies.borrow_mut().add(subscriber, producer);
    }

    pub(crate) fn detach_dependencies(&self, subscriber: &Element) {
        self.inner.dependencies.borrow_mut().detach(subscriber.id());
    }

    pub(crate) fn clear_dependencies(&self, subscriber: &Element) -> bool {
        self.inner.dependencies.borrow_mut().clear(subscriber.id())
    }

    pub(crate) fn remove_producer(&self, producer: &Element) {
        self.inner.dependencies.borrow_mut().remove_producer(producer.id());
    }

    pub(crate) fn notify_dependents(&self, producer: &Element) {
        let subscribers = self.inner.dependencies.borrow().subscribers_of(producer.id());
        for subscriber in subscribers {
            subscriber.did_change_dependencies();
        }
    }
}

fn unmount_subtree(element: &Element) -> usize {
    let unmounted: usize = element.children().iter().map(unmount_subtree).sum();
    element.unmount();
    unmounted + 1
}

impl fmt::Debug for BuildOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOwner")
            .field("pass", &self.pass_id())
            .field("dirty", &self.dirty_count())
            .field("inactive", &self.inactive_count())
            .field("building", &self.is_building())
            .finish()
    }
}
