//! Behaviours of elements that derive a single child from their
//! configuration instead of owning a primitive.

use std::panic::{self, AssertUnwindSafe};

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::widget::{ErrorWidget, State, Widget};

use super::{Children, Element, ElementBehavior};

/// Builds the child configuration, containing failures, then reconciles the
/// single child against it.
///
/// A panic while reconciling the child is contained the same way: the child
/// is dropped and the placeholder takes its slot.
fn rebuild_component(
    element: &Element,
    build: impl FnOnce(&BuildContext<'_>) -> Result<Widget, BuildError>,
) {
    let ctx = BuildContext::new(element);
    let built = match panic::catch_unwind(AssertUnwindSafe(|| build(&ctx))) {
        Ok(Ok(widget)) => widget,
        Ok(Err(error)) => placeholder(element, format!("building {element}"), error),
        Err(payload) => placeholder(
            element,
            format!("building {element}"),
            BuildError::from_panic(payload),
        ),
    };
    element.clear_dirty();
    let current = element.single_child();
    let reconciled = panic::catch_unwind(AssertUnwindSafe(|| {
        element.update_child(current.clone(), Some(&built), element.slot())
    }));
    let child = match reconciled {
        Ok(child) => child,
        Err(payload) => {
            let fallback = placeholder(
                element,
                format!("reconciling the child of {element}"),
                BuildError::from_panic(payload),
            );
            if let Some(stale) = current.filter(|child| {
                child.parent().is_some_and(|parent| parent.ptr_eq(element))
            }) {
                element.deactivate_child(&stale);
            }
            element.update_child(None, Some(&fallback), element.slot())
        }
    };
    element.set_children(Children::Single(child));
}

fn placeholder(element: &Element, context: String, error: BuildError) -> Widget {
    let details = element.report(context, error);
    match element.owner() {
        Some(owner) => owner.error_widget(&details),
        None => Widget::primitive(ErrorWidget::from_details(&details)),
    }
}

pub(crate) struct StatelessBehavior;

impl ElementBehavior for StatelessBehavior {
    fn first_build(&self, element: &Element) {
        element.rebuild(false);
    }

    fn update(&self, element: &Element, _old_widget: &Widget) {
        element.rebuild(true);
    }

    fn perform_rebuild(&self, element: &Element) {
        rebuild_component(element, |ctx| match ctx.widget() {
            Widget::Stateless(widget) => widget.build(ctx),
            other => Err(BuildError::msg(format!("{other:?} is not stateless"))),
        });
    }

    fn activate(&self, element: &Element) {
        element.request_rebuild();
    }
}

pub(crate) struct StatefulBehavior;

impl StatefulBehavior {
    fn with_state(
        element: &Element,
        hook: &str,
        f: impl FnOnce(&mut dyn State, &BuildContext<'_>),
    ) {
        let Some(cell) = element.state_cell() else {
            return;
        };
        let Ok(mut state) = cell.try_borrow_mut() else {
            log::warn!("skipping {hook} of {element}: state is borrowed");
            return;
        };
        let ctx = BuildContext::new(element);
        element.guard_user_code(hook, || f(&mut **state, &ctx));
    }
}

impl ElementBehavior for StatefulBehavior {
    fn first_build(&self, element: &Element) {
        Self::with_state(element, "init_state", |state, ctx| {
            state.init_state(ctx);
            state.did_change_dependencies(ctx);
        });
        element.rebuild(false);
    }

    fn update(&self, element: &Element, old_widget: &Widget) {
        Self::with_state(element, "did_update_widget", |state, ctx| {
            state.did_update_widget(ctx, old_widget);
        });
        element.rebuild(true);
    }

    fn perform_rebuild(&self, element: &Element) {
        if element.take_dependencies_changed() {
            Self::with_state(element, "did_change_dependencies", |state, ctx| {
                state.did_change_dependencies(ctx);
            });
        }
        rebuild_component(element, |ctx| {
            let cell = element
                .state_cell()
                .ok_or_else(|| BuildError::msg(format!("{element} has no state")))?;
            let mut state = cell
                .try_borrow_mut()
                .map_err(|_| BuildError::msg(format!("state of {element} is already borrowed")))?;
            state.build(ctx)
        });
    }

    fn did_change_dependencies(&self, element: &Element) {
        element.set_dependencies_changed();
        element.request_rebuild();
    }

    fn activate(&self, element: &Element) {
        Self::with_state(element, "activate", |state, ctx| state.activate(ctx));
        element.request_rebuild();
    }

    fn deactivate(&self, element: &Element) {
        Self::with_state(element, "deactivate", |state, ctx| state.deactivate(ctx));
    }

    fn unmount(&self, element: &Element) {
        Self::with_state(element, "dispose", |state, _| state.dispose());
    }
}

pub(crate) struct ProxyBehavior;

impl ElementBehavior for ProxyBehavior {
    fn first_build(&self, element: &Element) {
        element.rebuild(false);
    }

    fn update(&self, element: &Element, _old_widget: &Widget) {
        element.apply_parent_data_to_descendants();
        element.rebuild(true);
    }

    fn perform_rebuild(&self, element: &Element) {
        rebuild_component(element, |ctx| match ctx.widget() {
            Widget::Proxy(widget) => Ok(widget.child()),
            other => Err(BuildError::msg(format!("{other:?} is not a proxy"))),
        });
    }

    fn activate(&self, element: &Element) {
        element.request_rebuild();
    }
}

pub(crate) struct InheritedBehavior;

impl ElementBehavior for InheritedBehavior {
    fn first_build(&self, element: &Element) {
        element.rebuild(false);
    }

    fn update(&self, element: &Element, old_widget: &Widget) {
        let notify = match element.widget() {
            Widget::Inherited(widget) => widget.update_should_notify(old_widget.as_any()),
            _ => true,
        };
        if notify {
            if let Some(owner) = element.owner() {
                owner.notify_dependents(element);
            }
        }
        element.rebuild(true);
    }

    fn perform_rebuild(&self, element: &Element) {
        rebuild_component(element, |ctx| match ctx.widget() {
            Widget::Inherited(widget) => Ok(widget.child()),
            other => Err(BuildError::msg(format!("{other:?} is not inherited"))),
        });
    }

    fn activate(&self, element: &Element) {
        element.request_rebuild();
    }

    fn unmount(&self, element: &Element) {
        if let Some(owner) = element.owner() {
            owner.remove_producer(element);
        }
    }
}
