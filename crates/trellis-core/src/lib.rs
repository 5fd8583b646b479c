#![doc = r"Element tree reconciliation and build scheduling for retained-mode UI."]

pub mod applier;
pub mod collections;
pub mod context;
pub mod element;
pub mod error;
pub mod key;
pub mod owner;
pub mod platform;
pub mod resource;
pub mod tree;
pub mod widget;

mod dependencies;
mod inactive;
mod mutator;
mod registry;

pub use applier::{place_child, Applier, MemoryApplier, Primitive, PrimitiveId, RootPrimitive};
pub use context::{BuildContext, ElementHandle, StateHandle};
pub use element::{Element, ElementId, Lifecycle, Slot, WeakElement};
pub use error::{BuildError, ErrorDetails, ErrorReporter, LogReporter, NodeError, TreeError};
pub use key::{GlobalKey, Key, ObjectKey, ValueKey};
pub use owner::{BuildOwner, ErrorWidgetBuilder, ListenerId, OwnerOptions};
pub use platform::{BuildScheduler, NoopScheduler};
pub use resource::TrackedResource;
pub use tree::ElementTree;
pub use widget::{
    AsAny, ErrorPrimitive, ErrorWidget, InheritedWidget, PrimitiveChildren, PrimitiveWidget,
    ProxyWidget, State, StatefulWidget, StatelessWidget, Widget, WidgetBase,
};
