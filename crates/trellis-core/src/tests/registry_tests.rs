use super::*;
use crate::applier::Primitive;
use crate::context::BuildContext;
use crate::widget::{PrimitiveWidget, Widget, WidgetBase};

struct Leaf;

impl WidgetBase for Leaf {}

impl PrimitiveWidget for Leaf {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(crate::applier::RootPrimitive::default())
    }
}

fn element() -> Element {
    Element::new(Widget::primitive(Leaf))
}

#[test]
fn latest_registration_wins_lookup() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::new();
    let first = element();
    let second = element();

    registry.register(&key, &first);
    registry.register(&key, &second);

    assert!(registry.lookup(&key).is_some_and(|found| found.ptr_eq(&second)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn stale_unregister_keeps_newer_claimant() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::new();
    let first = element();
    let second = element();
    registry.register(&key, &first);
    registry.register(&key, &second);

    assert!(!registry.unregister(&key, &first));
    assert!(registry.lookup(&key).is_some_and(|found| found.ptr_eq(&second)));
    assert!(registry.take_removed().is_empty());

    assert!(registry.unregister(&key, &second));
    assert!(registry.lookup(&key).is_none());
    assert_eq!(registry.take_removed(), vec![key]);
}

#[test]
fn re_registering_clears_pending_removal() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::new();
    let holder = element();
    registry.register(&key, &holder);
    registry.unregister(&key, &holder);
    registry.register(&key, &holder);
    assert!(registry.take_removed().is_empty());
}

#[test]
fn duplicates_are_reported_once_and_cleared() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::labeled("dup");
    let first = element();
    let second = element();
    registry.register(&key, &first);
    registry.register(&key, &second);

    let duplicates = registry.take_duplicates();
    assert_eq!(duplicates.len(), 1);
    assert!(duplicates[0].starts_with("GlobalKey#"));
    assert!(duplicates[0].contains("(dup) used by"));
    assert!(registry.take_duplicates().is_empty());
}

#[test]
fn dropped_claimant_is_not_a_duplicate() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::new();
    let survivor = element();
    {
        let transient = element();
        registry.register(&key, &transient);
        registry.register(&key, &survivor);
    }
    assert!(registry.take_duplicates().is_empty());
}

#[test]
fn same_element_registering_twice_is_not_contested() {
    let mut registry = GlobalKeyRegistry::default();
    let key = GlobalKey::new();
    let holder = element();
    registry.register(&key, &holder);
    registry.register(&key, &holder);
    assert!(registry.take_duplicates().is_empty());
}
