//! Headless harness driving an [`ElementTree`] over a [`RecordingApplier`].

use std::rc::Rc;

use trellis_core::{
    Applier, BuildOwner, Element, ElementTree, GlobalKey, OwnerOptions, PrimitiveId, TreeError,
    Widget,
};

use crate::applier::{MutationLog, RecordingApplier, TestPrimitive};
use crate::reporter::CollectingReporter;
use crate::widgets::Text;

/// Element tree wired to a recording applier and a collecting reporter.
///
/// Contract violations panic and debug checks are on unless the options say
/// otherwise. The root primitive's creation is cleared from the log.
pub struct TestTree {
    tree: ElementTree,
    log: MutationLog,
    reporter: CollectingReporter,
}

impl TestTree {
    pub fn new() -> Self {
        Self::with_options(
            OwnerOptions::new()
                .strict_contracts(true)
                .debug_checks(true),
        )
    }

    /// Builds a tree with `options`; the reporter is always replaced by the
    /// harness's collecting one.
    pub fn with_options(options: OwnerOptions) -> Self {
        let applier = RecordingApplier::new();
        let log = applier.log();
        let reporter = CollectingReporter::new();
        let tree = ElementTree::with_options(applier, options.reporter(Rc::new(reporter.clone())));
        log.clear();
        Self {
            tree,
            log,
            reporter,
        }
    }

    /// Non-strict tree: violations are logged and returned as errors.
    pub fn lenient() -> Self {
        Self::with_options(
            OwnerOptions::new()
                .strict_contracts(false)
                .debug_checks(true),
        )
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn owner(&self) -> &BuildOwner {
        self.tree.owner()
    }

    pub fn log(&self) -> &MutationLog {
        &self.log
    }

    pub fn reporter(&self) -> &CollectingReporter {
        &self.reporter
    }

    pub fn set_root(&self, widget: Widget) -> Result<(), TreeError> {
        self.tree.set_root_widget(widget)
    }

    pub fn update_root(&self, widget: Widget) -> Result<(), TreeError> {
        self.tree.update_root(Some(widget))
    }

    pub fn finalize(&self) -> Result<(), TreeError> {
        self.owner().finalize_tree()
    }

    pub fn pump(&self) -> Result<(), TreeError> {
        self.tree.pump()
    }

    /// Drains the mutation log as readable lines.
    pub fn take_described(&self) -> Vec<String> {
        self.log.take_described()
    }

    /// Element built for the root configuration.
    pub fn child(&self) -> Option<Element> {
        self.tree.child()
    }

    pub fn with_applier<R>(&self, f: impl FnOnce(&mut RecordingApplier) -> R) -> Option<R> {
        self.tree.with_applier(f)
    }

    pub fn with_primitive<R>(
        &self,
        id: PrimitiveId,
        f: impl FnOnce(&mut TestPrimitive) -> R,
    ) -> Option<R> {
        self.with_applier(|applier| applier.with_primitive(id, f).ok())
            .flatten()
    }

    /// Labels of the primitives directly below `id`, in order.
    pub fn labels_under(&self, id: PrimitiveId) -> Vec<String> {
        self.with_applier(|applier| {
            let children = applier
                .get_mut(id)
                .map(|primitive| primitive.children())
                .unwrap_or_default();
            children
                .into_iter()
                .map(|child| {
                    applier
                        .with_primitive(child, |test: &mut TestPrimitive| test.label.clone())
                        .unwrap_or_else(|_| format!("#{child}"))
                })
                .collect()
        })
        .unwrap_or_default()
    }

    /// Labels of the primitives attached to the root, in order.
    pub fn root_labels(&self) -> Vec<String> {
        self.tree
            .root_primitive()
            .map(|root| self.labels_under(root))
            .unwrap_or_default()
    }

    /// First element, depth-first, configured with a [`Text`] of `label`.
    pub fn find_text(&self, label: &str) -> Option<Element> {
        let mut pending = vec![self.tree.root().clone()];
        while let Some(element) = pending.pop() {
            let matches = element
                .widget()
                .downcast_ref::<Text>()
                .is_some_and(|text| text.label == label);
            if matches {
                return Some(element);
            }
            let mut children = element.children();
            children.reverse();
            pending.extend(children);
        }
        None
    }

    pub fn element_for(&self, key: &GlobalKey) -> Option<Element> {
        self.owner().global_key_element(key)
    }

    pub fn drain_tasks(&self) -> usize {
        self.tree.drain_tasks()
    }

    pub fn dump(&self) -> String {
        self.tree.dump()
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}
