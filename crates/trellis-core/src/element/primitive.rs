//! Behaviour of elements that own a backing primitive.
//!
//! The child layout (none, one, or an ordered list) is read from the
//! configuration's [`PrimitiveChildren`] on every update. When a compatible
//! update switches layouts, the old children are released first.

use crate::context::BuildContext;
use crate::mutator;
use crate::widget::{PrimitiveChildren, Widget};

use super::{Children, Element, ElementBehavior, Slot};

pub(crate) struct PrimitiveBehavior;

impl PrimitiveBehavior {
    fn create(element: &Element) {
        let (Widget::Primitive(widget), Some(owner)) = (element.widget(), element.owner()) else {
            return;
        };
        let ctx = BuildContext::new(element);
        let primitive = widget.create_primitive(&ctx);
        let id = owner.with_applier_mut(|applier| {
            let id = applier.create(primitive);
            if let Ok(primitive) = applier.get_mut(id) {
                primitive.mount();
            }
            id
        });
        log::trace!("created primitive {id} for {element}");
        element.set_primitive(Some(id));
        element.attach_primitive(element.slot());
    }

    fn sync_primitive(element: &Element) {
        let (Widget::Primitive(widget), Some(owner), Some(id)) =
            (element.widget(), element.owner(), element.primitive())
        else {
            return;
        };
        let ctx = BuildContext::new(element);
        owner.with_primitive_mut(id, |primitive| {
            widget.update_primitive(&ctx, primitive);
            primitive.update();
        });
    }

    fn sync_children(element: &Element, widget: &Widget) {
        let Widget::Primitive(primitive) = widget else {
            return;
        };
        let layout = primitive.children();
        if !same_layout(&element.inner.children.borrow(), &layout) {
            log::debug!("{element} changed its child layout");
            for child in element.children() {
                element.deactivate_child(&child);
            }
            element.set_children(match &layout {
                PrimitiveChildren::Leaf => Children::Leaf,
                PrimitiveChildren::Single(_) => Children::Single(None),
                PrimitiveChildren::Multi(_) => Children::Multi(Vec::new()),
            });
            element.clear_forgotten();
        }
        match layout {
            PrimitiveChildren::Leaf => {}
            PrimitiveChildren::Single(child) => {
                let current = element.single_child();
                let child = element.update_child(current, child, Slot::Single);
                element.set_children(Children::Single(child));
            }
            PrimitiveChildren::Multi(widgets) => {
                let current = element.multi_children();
                let children = element.update_children(current, widgets);
                element.set_children(Children::Multi(children));
                element.clear_forgotten();
            }
        }
    }
}

fn same_layout(children: &Children, layout: &PrimitiveChildren<'_>) -> bool {
    matches!(
        (children, layout),
        (Children::Leaf, PrimitiveChildren::Leaf)
            | (Children::Single(_), PrimitiveChildren::Single(_))
            | (Children::Multi(_), PrimitiveChildren::Multi(_))
    )
}

impl ElementBehavior for PrimitiveBehavior {
    fn first_build(&self, element: &Element) {
        Self::create(element);
        element.clear_dirty();
        let widget = element.widget();
        let Widget::Primitive(primitive) = &widget else {
            return;
        };
        match primitive.children() {
            PrimitiveChildren::Leaf => {}
            PrimitiveChildren::Single(child) => {
                let child = element.update_child(None, child, Slot::Single);
                element.set_children(Children::Single(child));
            }
            PrimitiveChildren::Multi(widgets) => {
                let mut children: Vec<Element> = Vec::with_capacity(widgets.len());
                for (index, child) in widgets.iter().enumerate() {
                    let child = element.inflate(child.clone(), Slot::indexed(index, children.last()));
                    children.push(child);
                }
                element.set_children(Children::Multi(children));
            }
        }
    }

    fn update(&self, element: &Element, _old_widget: &Widget) {
        Self::sync_primitive(element);
        element.clear_dirty();
        Self::sync_children(element, &element.widget());
    }

    fn perform_rebuild(&self, element: &Element) {
        Self::sync_primitive(element);
        element.clear_dirty();
    }

    fn unmount(&self, element: &Element) {
        let (Widget::Primitive(widget), Some(owner), Some(id)) =
            (element.widget(), element.owner(), element.primitive())
        else {
            return;
        };
        owner.with_applier_mut(|applier| {
            if let Ok(primitive) = applier.get_mut(id) {
                widget.did_unmount_primitive(primitive);
            }
            mutator::destroy(applier, id);
        });
        element.set_primitive(None);
    }
}
