//! Root of an element tree and the entry points a host drives it through.

use crate::applier::{Applier, Primitive, PrimitiveId, RootPrimitive};
use crate::context::BuildContext;
use crate::element::Element;
use crate::error::TreeError;
use crate::owner::{BuildOwner, OwnerOptions};
use crate::widget::{PrimitiveChildren, PrimitiveWidget, Widget, WidgetBase};

struct RootWidget {
    child: Option<Widget>,
}

impl WidgetBase for RootWidget {}

impl PrimitiveWidget for RootWidget {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(RootPrimitive::default())
    }

    fn children(&self) -> PrimitiveChildren<'_> {
        PrimitiveChildren::Single(self.child.as_ref())
    }
}

/// An owner together with the root element it builds.
pub struct ElementTree {
    owner: BuildOwner,
    root: Element,
}

impl ElementTree {
    pub fn new(applier: impl Applier) -> Self {
        Self::with_options(applier, OwnerOptions::default())
    }

    pub fn with_options(applier: impl Applier, options: OwnerOptions) -> Self {
        let owner = BuildOwner::with_options(applier, options);
        let root = owner.create_root(Widget::primitive(RootWidget { child: None }));
        if let Err(err) = owner.mount_root(&root) {
            log::warn!("mounting the root failed: {err}");
        }
        Self { owner, root }
    }

    pub fn owner(&self) -> &BuildOwner {
        &self.owner
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Element built for the current root configuration.
    pub fn child(&self) -> Option<Element> {
        self.root.children().into_iter().next()
    }

    pub fn root_primitive(&self) -> Option<PrimitiveId> {
        self.root.primitive()
    }

    /// Reconciles `widget` against the current tree without finalizing.
    /// Elements removed by the update stay inactive until
    /// [`BuildOwner::finalize_tree`].
    pub fn update_root(&self, widget: Option<Widget>) -> Result<(), TreeError> {
        self.owner
            .update_root(&self.root, Widget::primitive(RootWidget { child: widget }))
    }

    /// Reconciles `widget` against the current tree and finalizes the pass.
    pub fn set_root_widget(&self, widget: Widget) -> Result<(), TreeError> {
        self.update_root(Some(widget))?;
        self.owner.finalize_tree()
    }

    /// Removes every element below the root.
    pub fn clear_root(&self) -> Result<(), TreeError> {
        self.update_root(None)?;
        self.owner.finalize_tree()
    }

    /// Rebuilds dirty elements and finalizes the pass.
    pub fn pump(&self) -> Result<(), TreeError> {
        self.owner.build_scope(&self.root)?;
        self.owner.finalize_tree()
    }

    pub fn needs_build(&self) -> bool {
        self.owner.needs_build()
    }

    pub fn drain_tasks(&self) -> usize {
        self.owner.drain_tasks()
    }

    pub fn with_applier<A: Applier, R>(&self, f: impl FnOnce(&mut A) -> R) -> Option<R> {
        self.owner.with_applier(f)
    }

    pub fn dump(&self) -> String {
        self.root.to_string_deep()
    }
}

impl std::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementTree")
            .field("owner", &self.owner)
            .field("root", &self.root)
            .finish()
    }
}
