//! Views of an element handed to user code.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::element::{Element, Lifecycle, WeakElement};
use crate::error::TreeError;
use crate::resource::TrackedResource;
use crate::widget::{InheritedWidget, State, Widget};

/// The element currently being built, as seen from a build method or a
/// state hook.
pub struct BuildContext<'a> {
    element: &'a Element,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(element: &'a Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        self.element
    }

    pub fn widget(&self) -> Widget {
        self.element.widget()
    }

    /// Current configuration downcast to its concrete type.
    pub fn widget_as<W: 'static>(&self) -> Option<Rc<W>> {
        self.element.widget().downcast_rc::<W>()
    }

    pub fn depth(&self) -> usize {
        self.element.depth()
    }

    /// Reads the nearest `W` above this element and subscribes to it: the
    /// element rebuilds whenever that ancestor is updated with a value for
    /// which [`InheritedWidget::update_should_notify`] holds.
    pub fn depend_on_inherited<W: InheritedWidget>(&self) -> Option<Rc<W>> {
        self.element
            .inherited_ancestor(TypeId::of::<W>(), true)
            .and_then(|ancestor| ancestor.widget().downcast_rc::<W>())
    }

    /// Like [`Self::depend_on_inherited`] without subscribing.
    pub fn get_inherited<W: InheritedWidget>(&self) -> Option<Rc<W>> {
        self.element
            .inherited_ancestor(TypeId::of::<W>(), false)
            .and_then(|ancestor| ancestor.widget().downcast_rc::<W>())
    }

    pub fn find_ancestor_widget<W: 'static>(&self) -> Option<Rc<W>> {
        let mut current = self.element.parent();
        while let Some(element) = current {
            if let Some(widget) = element.widget().downcast_rc::<W>() {
                return Some(widget);
            }
            current = element.parent();
        }
        None
    }

    /// Runs `f` against the nearest ancestor state of type `S`.
    pub fn with_ancestor_state<S: State, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let wanted = TypeId::of::<S>();
        let mut current = self.element.parent();
        while let Some(element) = current {
            if element.state_type() == Some(wanted) {
                return element.with_state(f);
            }
            current = element.parent();
        }
        None
    }

    pub fn mark_needs_build(&self) -> Result<(), TreeError> {
        self.element.mark_needs_build()
    }

    pub fn handle(&self) -> ElementHandle {
        self.element.handle()
    }

    /// Handle for mutating this element's state from outside a build.
    pub fn state_handle<S: State>(&self) -> Option<StateHandle<S>> {
        (self.element.state_type() == Some(TypeId::of::<S>())).then(|| StateHandle {
            element: self.element.downgrade(),
            marker: PhantomData,
        })
    }

    /// Registers a resource that must be released before this element is
    /// disposed.
    pub fn track_resource(&self, label: impl Into<Rc<str>>) -> TrackedResource {
        self.element.track_resource(label.into())
    }
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuildContext({})", self.element)
    }
}

/// Weak reference used to request rebuilds in response to external events.
#[derive(Clone, Debug)]
pub struct ElementHandle {
    element: WeakElement,
}

impl ElementHandle {
    pub(crate) fn new(element: WeakElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> Option<Element> {
        self.element.upgrade()
    }

    pub fn is_mounted(&self) -> bool {
        self.element()
            .is_some_and(|element| element.lifecycle() == Lifecycle::Active)
    }

    pub fn mark_needs_build(&self) -> Result<(), TreeError> {
        match self.element() {
            Some(element) => element.mark_needs_build(),
            None => {
                log::warn!("rebuild requested for a dropped element");
                Err(TreeError::ElementDefunct {
                    element: "<dropped>".into(),
                })
            }
        }
    }
}

/// Typed handle to the state of a stateful element.
pub struct StateHandle<S> {
    element: WeakElement,
    marker: PhantomData<fn() -> S>,
}

impl<S: State> StateHandle<S> {
    /// Mutates the state and schedules the element for rebuild.
    pub fn set_state(&self, f: impl FnOnce(&mut S)) -> Result<(), TreeError> {
        let Some(element) = self.element.upgrade() else {
            log::warn!("set_state called on a dropped element");
            return Err(TreeError::ElementDefunct {
                element: "<dropped>".into(),
            });
        };
        if element.lifecycle() == Lifecycle::Defunct {
            return Err(element.contract(TreeError::ElementDefunct {
                element: element.to_string(),
            }));
        }
        element.with_state_mut(f)?;
        element.mark_needs_build()
    }

    /// Reads the state without scheduling anything.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.element.upgrade()?.with_state(f)
    }

    pub fn is_mounted(&self) -> bool {
        self.element
            .upgrade()
            .is_some_and(|element| element.lifecycle() == Lifecycle::Active)
    }

    pub fn element(&self) -> Option<Element> {
        self.element.upgrade()
    }
}

impl<S> Clone for StateHandle<S> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for StateHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("element", &self.element)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}
