//! Small configuration catalog for exercising the element tree.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use trellis_core::{
    AsAny, BuildContext, BuildError, InheritedWidget, Key, Primitive, PrimitiveChildren,
    PrimitiveWidget, ProxyWidget, State, StatefulWidget, StatelessWidget, TrackedResource, Widget,
    WidgetBase,
};

use crate::applier::TestPrimitive;

fn with_test_primitive(primitive: &mut dyn Primitive, f: impl FnOnce(&mut TestPrimitive)) {
    if let Some(test) = primitive.as_any_mut().downcast_mut::<TestPrimitive>() {
        f(test);
    }
}

/// Leaf primitive carrying a label.
pub struct Text {
    pub label: String,
    pub key: Option<Key>,
}

impl Text {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: None,
        }
    }

    pub fn keyed(label: impl Into<String>, key: impl Into<Key>) -> Self {
        Self {
            label: label.into(),
            key: Some(key.into()),
        }
    }

    pub fn widget(self) -> Widget {
        Widget::primitive(self)
    }
}

impl WidgetBase for Text {
    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl PrimitiveWidget for Text {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(TestPrimitive::new(self.label.clone()))
    }

    fn update_primitive(&self, _ctx: &BuildContext<'_>, primitive: &mut dyn Primitive) {
        with_test_primitive(primitive, |test| test.label.clone_from(&self.label));
    }
}

/// Multi-child primitive.
pub struct Column {
    pub label: String,
    pub key: Option<Key>,
    pub children: Vec<Widget>,
}

impl Column {
    pub fn new(label: impl Into<String>, children: Vec<Widget>) -> Self {
        Self {
            label: label.into(),
            key: None,
            children,
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn widget(self) -> Widget {
        Widget::primitive(self)
    }
}

impl WidgetBase for Column {
    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl PrimitiveWidget for Column {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(TestPrimitive::new(self.label.clone()))
    }

    fn update_primitive(&self, _ctx: &BuildContext<'_>, primitive: &mut dyn Primitive) {
        with_test_primitive(primitive, |test| test.label.clone_from(&self.label));
    }

    fn children(&self) -> PrimitiveChildren<'_> {
        PrimitiveChildren::Multi(&self.children)
    }
}

/// Single-child primitive.
pub struct Boxed {
    pub label: String,
    pub key: Option<Key>,
    pub child: Option<Widget>,
}

impl Boxed {
    pub fn new(label: impl Into<String>, child: Option<Widget>) -> Self {
        Self {
            label: label.into(),
            key: None,
            child,
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn widget(self) -> Widget {
        Widget::primitive(self)
    }
}

impl WidgetBase for Boxed {
    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl PrimitiveWidget for Boxed {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(TestPrimitive::new(self.label.clone()))
    }

    fn children(&self) -> PrimitiveChildren<'_> {
        PrimitiveChildren::Single(self.child.as_ref())
    }
}

type BuildFn = Rc<dyn Fn(&BuildContext<'_>) -> Result<Widget, BuildError>>;

/// Stateless configuration built by a closure.
#[derive(Clone)]
pub struct Builder {
    pub key: Option<Key>,
    build: BuildFn,
}

impl Builder {
    pub fn new(build: impl Fn(&BuildContext<'_>) -> Result<Widget, BuildError> + 'static) -> Self {
        Self {
            key: None,
            build: Rc::new(build),
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn widget(self) -> Widget {
        Widget::stateless(self)
    }
}

impl WidgetBase for Builder {
    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl StatelessWidget for Builder {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Widget, BuildError> {
        (self.build)(ctx)
    }
}

/// Stateless configuration whose build fails, by error or by panic.
pub struct Failing {
    pub message: String,
    pub panics: bool,
}

impl Failing {
    pub fn error(message: impl Into<String>) -> Widget {
        Widget::stateless(Self {
            message: message.into(),
            panics: false,
        })
    }

    pub fn panic(message: impl Into<String>) -> Widget {
        Widget::stateless(Self {
            message: message.into(),
            panics: true,
        })
    }
}

impl WidgetBase for Failing {}

impl StatelessWidget for Failing {
    fn build(&self, _ctx: &BuildContext<'_>) -> Result<Widget, BuildError> {
        if self.panics {
            panic!("{}", self.message);
        }
        Err(BuildError::msg(self.message.clone()))
    }
}

/// Inherited value readable by descendants through [`Provider::of`].
pub struct Provider<T> {
    pub value: T,
    pub child: Widget,
}

impl<T: Clone + PartialEq + 'static> Provider<T> {
    pub fn new(value: T, child: Widget) -> Self {
        Self { value, child }
    }

    pub fn widget(self) -> Widget {
        Widget::inherited(self)
    }

    /// Reads the nearest value and subscribes the caller to changes.
    pub fn of(ctx: &BuildContext<'_>) -> Option<T> {
        ctx.depend_on_inherited::<Self>()
            .map(|provider| provider.value.clone())
    }

    /// Reads the nearest value without subscribing.
    pub fn peek(ctx: &BuildContext<'_>) -> Option<T> {
        ctx.get_inherited::<Self>()
            .map(|provider| provider.value.clone())
    }
}

impl<T: 'static> WidgetBase for Provider<T> {}

impl<T: 'static> ProxyWidget for Provider<T> {
    fn child(&self) -> Widget {
        self.child.clone()
    }
}

impl<T: Clone + PartialEq + 'static> InheritedWidget for Provider<T> {
    fn update_should_notify(&self, old: &dyn Any) -> bool {
        old.downcast_ref::<Self>()
            .map_or(true, |old| old.value != self.value)
    }
}

/// Proxy that tags the primitives directly below it.
pub struct ParentData {
    pub tag: String,
    pub child: Widget,
}

impl ParentData {
    pub fn new(tag: impl Into<String>, child: Widget) -> Widget {
        Widget::proxy(Self {
            tag: tag.into(),
            child,
        })
    }
}

impl WidgetBase for ParentData {}

impl ProxyWidget for ParentData {
    fn child(&self) -> Widget {
        self.child.clone()
    }

    fn apply_parent_data(&self, primitive: &mut dyn Primitive) {
        with_test_primitive(primitive, |test| test.parent_data = Some(self.tag.clone()));
    }
}

/// Shared list of lifecycle events recorded by [`Counter`] states.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        self.events.take()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|recorded| *recorded == event)
            .count()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.borrow().iter()).finish()
    }
}

/// Stateful configuration rendering `"{label}:{count}"` as a [`Text`].
pub struct Counter {
    pub label: String,
    pub key: Option<Key>,
    pub events: EventLog,
    /// Acquire a tracked resource in `init_state`, released in `dispose`
    /// unless `leak` is set.
    pub track: bool,
    pub leak: bool,
}

impl Counter {
    pub fn new(label: impl Into<String>, events: &EventLog) -> Self {
        Self {
            label: label.into(),
            key: None,
            events: events.clone(),
            track: false,
            leak: false,
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn tracking(mut self, leak: bool) -> Self {
        self.track = true;
        self.leak = leak;
        self
    }

    pub fn widget(self) -> Widget {
        Widget::stateful(self)
    }
}

impl WidgetBase for Counter {
    fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }
}

impl StatefulWidget for Counter {
    fn create_state(&self) -> Box<dyn State> {
        Box::new(CounterState::default())
    }
}

#[derive(Default)]
pub struct CounterState {
    pub count: u32,
    label: String,
    events: EventLog,
    resource: Option<TrackedResource>,
    leak: bool,
}

impl CounterState {
    fn record(&self, event: &str) {
        self.events.push(format!("{event} {}", self.label));
    }
}

impl State for CounterState {
    fn init_state(&mut self, ctx: &BuildContext<'_>) {
        if let Some(widget) = ctx.widget_as::<Counter>() {
            self.label.clone_from(&widget.label);
            self.events = widget.events.clone();
            self.leak = widget.leak;
            if widget.track {
                self.resource = Some(ctx.track_resource(format!("{} subscription", widget.label)));
            }
        }
        self.record("init");
    }

    fn did_update_widget(&mut self, ctx: &BuildContext<'_>, _old_widget: &Widget) {
        if let Some(widget) = ctx.widget_as::<Counter>() {
            self.label.clone_from(&widget.label);
        }
        self.record("update");
    }

    fn activate(&mut self, _ctx: &BuildContext<'_>) {
        self.record("activate");
    }

    fn deactivate(&mut self, _ctx: &BuildContext<'_>) {
        self.record("deactivate");
    }

    fn dispose(&mut self) {
        self.record("dispose");
        match self.resource.take() {
            Some(resource) if self.leak => std::mem::forget(resource),
            Some(resource) => resource.release(),
            None => {}
        }
    }

    fn build(&mut self, _ctx: &BuildContext<'_>) -> Result<Widget, BuildError> {
        self.record("build");
        Ok(Text::new(format!("{}:{}", self.label, self.count)).widget())
    }
}
