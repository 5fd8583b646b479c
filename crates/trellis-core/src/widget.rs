//! Configuration model.
//!
//! A [`Widget`] is an immutable description of what should occupy a place in
//! the tree. It is rebuilt from scratch on every build and is cheap to clone:
//! every variant is a reference-counted trait object. The variant decides
//! which element strategy backs the configuration once it is inflated.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::applier::Primitive;
use crate::context::BuildContext;
use crate::error::{BuildError, ErrorDetails};
use crate::key::Key;

/// Type-erasure helpers implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Behaviour shared by every configuration variant.
pub trait WidgetBase: AsAny {
    fn key(&self) -> Option<&Key> {
        None
    }
}

pub trait StatelessWidget: WidgetBase {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Widget, BuildError>;
}

pub trait StatefulWidget: WidgetBase {
    fn create_state(&self) -> Box<dyn State>;
}

/// Long-lived state owned by the element of a [`StatefulWidget`].
///
/// The current configuration is available through [`BuildContext::widget`].
pub trait State: AsAny {
    fn init_state(&mut self, _ctx: &BuildContext<'_>) {}

    fn did_change_dependencies(&mut self, _ctx: &BuildContext<'_>) {}

    fn did_update_widget(&mut self, _ctx: &BuildContext<'_>, _old_widget: &Widget) {}

    fn activate(&mut self, _ctx: &BuildContext<'_>) {}

    fn deactivate(&mut self, _ctx: &BuildContext<'_>) {}

    /// Releases everything the state acquired. Resources registered through
    /// [`BuildContext::track_resource`] must be released here.
    fn dispose(&mut self) {}

    fn build(&mut self, ctx: &BuildContext<'_>) -> Result<Widget, BuildError>;
}

/// Single-child pass-through configuration.
pub trait ProxyWidget: WidgetBase {
    fn child(&self) -> Widget;

    /// Pushes data owned by this proxy onto the nearest primitive below it.
    fn apply_parent_data(&self, _primitive: &mut dyn Primitive) {}
}

/// Proxy whose value can be read, and subscribed to, by descendants.
pub trait InheritedWidget: ProxyWidget {
    /// Returns whether dependents must rebuild after `old` was replaced by
    /// `self`.
    fn update_should_notify(&self, old: &dyn Any) -> bool;
}

pub enum PrimitiveChildren<'a> {
    Leaf,
    Single(Option<&'a Widget>),
    Multi(&'a [Widget]),
}

/// Configuration that owns a backing primitive.
pub trait PrimitiveWidget: WidgetBase {
    fn create_primitive(&self, ctx: &BuildContext<'_>) -> Box<dyn Primitive>;

    fn update_primitive(&self, _ctx: &BuildContext<'_>, _primitive: &mut dyn Primitive) {}

    fn did_unmount_primitive(&self, _primitive: &mut dyn Primitive) {}

    fn children(&self) -> PrimitiveChildren<'_> {
        PrimitiveChildren::Leaf
    }
}

#[derive(Clone)]
pub enum Widget {
    Stateless(Rc<dyn StatelessWidget>),
    Stateful(Rc<dyn StatefulWidget>),
    Inherited(Rc<dyn InheritedWidget>),
    Proxy(Rc<dyn ProxyWidget>),
    Primitive(Rc<dyn PrimitiveWidget>),
}

impl Widget {
    pub fn stateless(widget: impl StatelessWidget) -> Self {
        Widget::Stateless(Rc::new(widget))
    }

    pub fn stateful(widget: impl StatefulWidget) -> Self {
        Widget::Stateful(Rc::new(widget))
    }

    pub fn inherited(widget: impl InheritedWidget) -> Self {
        Widget::Inherited(Rc::new(widget))
    }

    pub fn proxy(widget: impl ProxyWidget) -> Self {
        Widget::Proxy(Rc::new(widget))
    }

    pub fn primitive(widget: impl PrimitiveWidget) -> Self {
        Widget::Primitive(Rc::new(widget))
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Widget::Stateless(widget) => widget.key(),
            Widget::Stateful(widget) => widget.key(),
            Widget::Inherited(widget) => widget.key(),
            Widget::Proxy(widget) => widget.key(),
            Widget::Primitive(widget) => widget.key(),
        }
    }

    pub fn as_any(&self) -> &dyn Any {
        match self {
            Widget::Stateless(widget) => (**widget).as_any(),
            Widget::Stateful(widget) => (**widget).as_any(),
            Widget::Inherited(widget) => (**widget).as_any(),
            Widget::Proxy(widget) => (**widget).as_any(),
            Widget::Primitive(widget) => (**widget).as_any(),
        }
    }

    /// Concrete type of the wrapped configuration.
    pub fn concrete_type(&self) -> TypeId {
        self.as_any().type_id()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Widget::Stateless(widget) => (**widget).type_name(),
            Widget::Stateful(widget) => (**widget).type_name(),
            Widget::Inherited(widget) => (**widget).type_name(),
            Widget::Proxy(widget) => (**widget).type_name(),
            Widget::Primitive(widget) => (**widget).type_name(),
        }
    }

    pub fn short_name(&self) -> &'static str {
        let name = self.type_name();
        let base = name.split('<').next().unwrap_or(name);
        base.rsplit("::").next().unwrap_or(base)
    }

    fn address(&self) -> *const () {
        match self {
            Widget::Stateless(widget) => Rc::as_ptr(widget) as *const (),
            Widget::Stateful(widget) => Rc::as_ptr(widget) as *const (),
            Widget::Inherited(widget) => Rc::as_ptr(widget) as *const (),
            Widget::Proxy(widget) => Rc::as_ptr(widget) as *const (),
            Widget::Primitive(widget) => Rc::as_ptr(widget) as *const (),
        }
    }

    /// Identity comparison: both values refer to the same configuration
    /// object.
    pub fn ptr_eq(&self, other: &Widget) -> bool {
        self.address() == other.address()
    }

    /// Whether an element configured with `self` may be updated in place to
    /// `other`.
    pub fn can_update(&self, other: &Widget) -> bool {
        self.concrete_type() == other.concrete_type() && self.key() == other.key()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_rc<T: 'static>(&self) -> Option<Rc<T>> {
        let any = match self {
            Widget::Stateless(widget) => widget.clone().into_any_rc(),
            Widget::Stateful(widget) => widget.clone().into_any_rc(),
            Widget::Inherited(widget) => widget.clone().into_any_rc(),
            Widget::Proxy(widget) => widget.clone().into_any_rc(),
            Widget::Primitive(widget) => widget.clone().into_any_rc(),
        };
        any.downcast::<T>().ok()
    }

    pub(crate) fn is_composite(&self) -> bool {
        !matches!(self, Widget::Primitive(_))
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "{}-[{key:?}]", self.short_name()),
            None => f.write_str(self.short_name()),
        }
    }
}

/// Leaf placeholder shown in place of a subtree whose build failed.
pub struct ErrorWidget {
    message: String,
}

impl ErrorWidget {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_details(details: &ErrorDetails) -> Self {
        Self::new(details.error.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl WidgetBase for ErrorWidget {}

impl PrimitiveWidget for ErrorWidget {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(ErrorPrimitive {
            message: self.message.clone(),
        })
    }

    fn update_primitive(&self, _ctx: &BuildContext<'_>, primitive: &mut dyn Primitive) {
        if let Some(error) = primitive.as_any_mut().downcast_mut::<ErrorPrimitive>() {
            error.message.clone_from(&self.message);
        }
    }
}

/// Backing primitive of [`ErrorWidget`].
#[derive(Debug)]
pub struct ErrorPrimitive {
    pub message: String,
}

impl Primitive for ErrorPrimitive {}
