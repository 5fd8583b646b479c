use trellis_core::{
    BuildContext, Key, Lifecycle, Primitive, PrimitiveChildren, PrimitiveWidget, Widget,
    WidgetBase,
};
use trellis_testing::{Boxed, Column, ParentData, TestPrimitive, TestTree, Text};

fn keyed_texts(items: &[(&str, u32)]) -> Vec<Widget> {
    items
        .iter()
        .map(|(label, key)| Text::keyed(*label, Key::value(*key)).widget())
        .collect()
}

fn column(children: Vec<Widget>) -> Widget {
    Column::new("col", children).widget()
}

fn column_primitive(test: &TestTree) -> usize {
    test.child()
        .and_then(|element| element.primitive())
        .expect("column primitive")
}

#[test]
fn initial_build_creates_and_inserts_in_order() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 2)])))
        .expect("build");

    assert_eq!(
        test.take_described(),
        vec![
            "create col",
            "insert col first",
            "create a",
            "insert a first",
            "create b",
            "insert b after a",
        ]
    );
    assert_eq!(test.root_labels(), vec!["col"]);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["a", "b"]);
}

#[test]
fn keyed_reorder_with_insert_and_removal() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 2), ("c", 3)])))
        .expect("initial build");
    let a = test.find_text("a").expect("a");
    let b = test.find_text("b").expect("b");
    let c = test.find_text("c").expect("c");
    test.log().clear();

    test.set_root(column(keyed_texts(&[("b", 2), ("a", 1), ("d", 4)])))
        .expect("rebuild");

    assert_eq!(
        test.take_described(),
        vec![
            "move b first",
            "create d",
            "insert d after a",
            "remove c",
            "destroy c",
        ]
    );
    assert!(test.find_text("a").is_some_and(|found| found.ptr_eq(&a)));
    assert!(test.find_text("b").is_some_and(|found| found.ptr_eq(&b)));
    assert_eq!(c.lifecycle(), Lifecycle::Defunct);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["b", "a", "d"]);

    let order: Vec<String> = test
        .child()
        .expect("column")
        .children()
        .iter()
        .map(|child| format!("{:?}", child.key().expect("keyed")))
        .collect();
    assert_eq!(order, vec!["ValueKey(2)", "ValueKey(1)", "ValueKey(4)"]);
}

#[test]
fn swapping_two_keyed_children_issues_one_move() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 2), ("c", 3)])))
        .expect("initial build");
    let elements: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|label| test.find_text(label).expect("element"))
        .collect();
    test.log().clear();

    test.set_root(column(keyed_texts(&[("a", 1), ("c", 3), ("b", 2)])))
        .expect("rebuild");

    assert_eq!(test.take_described(), vec!["move c after a"]);
    for (label, element) in ["a", "b", "c"].iter().zip(&elements) {
        assert!(test.find_text(label).is_some_and(|found| found.ptr_eq(element)));
    }
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["a", "c", "b"]);
}

#[test]
fn reconciling_identical_configuration_is_silent() {
    let test = TestTree::new();
    let root = column(keyed_texts(&[("a", 1), ("b", 2)]));
    test.set_root(root.clone()).expect("initial build");
    let before = test.child().expect("column");
    test.log().clear();

    test.set_root(root).expect("rebuild");

    assert!(test.log().is_empty(), "unexpected mutations: {:?}", test.log());
    assert!(test.child().is_some_and(|after| after.ptr_eq(&before)));
}

#[test]
fn compatible_update_keeps_element_and_primitive() {
    let test = TestTree::new();
    test.set_root(column(vec![Text::new("a").widget()]))
        .expect("initial build");
    let element = test.find_text("a").expect("a");
    let primitive = element.primitive().expect("primitive");
    test.log().clear();

    test.set_root(column(vec![Text::new("a2").widget()]))
        .expect("rebuild");

    assert!(test.log().entries().iter().all(|mutation| !mutation.is_structural()));
    assert!(test.log().is_empty());
    let updated = test.find_text("a2").expect("a2");
    assert!(updated.ptr_eq(&element));
    assert_eq!(updated.primitive(), Some(primitive));
    assert_eq!(
        test.with_primitive(primitive, |text| (text.label.clone(), text.updates)),
        Some(("a2".to_string(), 1))
    );
}

#[test]
fn incompatible_update_replaces_subtree() {
    let test = TestTree::new();
    test.set_root(column(vec![Text::new("a").widget()]))
        .expect("initial build");
    let old = test.find_text("a").expect("a");
    test.log().clear();

    test.update_root(column(vec![Boxed::new("x", None).widget()]))
        .expect("rebuild");
    assert_eq!(old.lifecycle(), Lifecycle::Inactive);
    assert_eq!(
        test.take_described(),
        vec!["remove a", "create x", "insert x first"]
    );

    test.finalize().expect("finalize");
    assert_eq!(old.lifecycle(), Lifecycle::Defunct);
    assert_eq!(test.take_described(), vec!["destroy a"]);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["x"]);
}

#[test]
fn key_change_forces_replacement() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1)])))
        .expect("initial build");
    let old = test.find_text("a").expect("a");

    test.set_root(column(keyed_texts(&[("a", 9)])))
        .expect("rebuild");

    let new = test.find_text("a").expect("a");
    assert!(!new.ptr_eq(&old));
    assert_eq!(old.lifecycle(), Lifecycle::Defunct);
}

#[test]
fn unkeyed_children_match_by_position() {
    let test = TestTree::new();
    test.set_root(column(vec![
        Text::new("a").widget(),
        Text::new("b").widget(),
    ]))
    .expect("initial build");
    let first = test.find_text("a").expect("a");
    test.log().clear();

    test.set_root(column(vec![
        Text::new("b").widget(),
        Text::new("a").widget(),
        Text::new("c").widget(),
    ]))
    .expect("rebuild");

    assert!(test.find_text("b").is_some_and(|found| found.ptr_eq(&first)));
    // the log names primitives by the label they were created with
    assert_eq!(test.take_described(), vec!["create c", "insert c after b"]);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["b", "a", "c"]);
}

#[test]
fn shrinking_list_removes_tail() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 2), ("c", 3)])))
        .expect("initial build");
    test.log().clear();

    test.set_root(column(keyed_texts(&[("a", 1)])))
        .expect("rebuild");

    // leftover keyed children are released in map order
    let mut described = test.take_described();
    described.sort();
    assert_eq!(
        described,
        vec!["destroy b", "destroy c", "remove b", "remove c"]
    );
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["a"]);
}

#[test]
fn clearing_the_root_destroys_everything() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1)])))
        .expect("initial build");
    let column_element = test.child().expect("column");

    test.tree().clear_root().expect("clear");

    assert!(test.child().is_none());
    assert_eq!(column_element.lifecycle(), Lifecycle::Defunct);
    assert!(test.root_labels().is_empty());
    let described = test.take_described();
    assert_eq!(described.first().map(String::as_str), Some("remove col"));
    assert!(described.contains(&"destroy a".to_string()));
    assert!(described.contains(&"destroy col".to_string()));
}

#[test]
fn parent_data_follows_the_proxy() {
    let test = TestTree::new();
    let text = Text::new("a").widget();
    test.set_root(column(vec![ParentData::new("flex", text.clone())]))
        .expect("initial build");
    let primitive = test
        .find_text("a")
        .and_then(|element| element.primitive())
        .expect("text primitive");
    assert_eq!(
        test.with_primitive(primitive, |text| text.parent_data.clone()),
        Some(Some("flex".to_string()))
    );

    test.set_root(column(vec![ParentData::new("grow", text)]))
        .expect("rebuild");
    assert_eq!(
        test.with_primitive(primitive, |text| text.parent_data.clone()),
        Some(Some("grow".to_string()))
    );
}

#[test]
fn siblings_sharing_a_key_are_all_released() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 1)])))
        .expect("initial build");
    let a = test.find_text("a").expect("a");
    let b = test.find_text("b").expect("b");

    test.set_root(column(keyed_texts(&[("c", 2)])))
        .expect("rebuild");

    assert_eq!(a.lifecycle(), Lifecycle::Defunct);
    assert_eq!(b.lifecycle(), Lifecycle::Defunct);
    assert_eq!(test.child().expect("column").children().len(), 1);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["c"]);
}

#[test]
fn shared_key_is_matched_by_the_first_claimant() {
    let test = TestTree::new();
    test.set_root(column(keyed_texts(&[("a", 1), ("b", 1), ("z", 9)])))
        .expect("initial build");
    let a = test.find_text("a").expect("a");
    let b = test.find_text("b").expect("b");
    let z = test.find_text("z").expect("z");

    test.set_root(column(keyed_texts(&[("y", 8), ("c", 1)])))
        .expect("rebuild");

    assert!(test.find_text("c").is_some_and(|c| c.ptr_eq(&a)));
    assert_eq!(a.lifecycle(), Lifecycle::Active);
    assert_eq!(b.lifecycle(), Lifecycle::Defunct);
    assert_eq!(z.lifecycle(), Lifecycle::Defunct);
    assert_eq!(test.labels_under(column_primitive(&test)), vec!["y", "c"]);
}

/// Primitive that holds either one child or a list, depending on `children`.
struct Flexible {
    child: Option<Widget>,
    children: Option<Vec<Widget>>,
}

impl WidgetBase for Flexible {}

impl PrimitiveWidget for Flexible {
    fn create_primitive(&self, _ctx: &BuildContext<'_>) -> Box<dyn Primitive> {
        Box::new(TestPrimitive::new("flexible"))
    }

    fn children(&self) -> PrimitiveChildren<'_> {
        match &self.children {
            Some(children) => PrimitiveChildren::Multi(children),
            None => PrimitiveChildren::Single(self.child.as_ref()),
        }
    }
}

#[test]
fn switching_child_layout_releases_old_children() {
    let test = TestTree::new();
    test.set_root(Widget::primitive(Flexible {
        child: Some(Text::new("only").widget()),
        children: None,
    }))
    .expect("initial build");
    let only = test.find_text("only").expect("only");
    let flexible = test.child().and_then(|element| element.primitive()).expect("primitive");
    assert_eq!(test.labels_under(flexible), vec!["only"]);

    test.set_root(Widget::primitive(Flexible {
        child: None,
        children: Some(vec![Text::new("x").widget(), Text::new("y").widget()]),
    }))
    .expect("switch to list");

    assert_eq!(only.lifecycle(), Lifecycle::Defunct);
    assert_eq!(test.child().expect("flexible").children().len(), 2);
    assert_eq!(test.labels_under(flexible), vec!["x", "y"]);

    test.set_root(Widget::primitive(Flexible {
        child: Some(Text::new("back").widget()),
        children: None,
    }))
    .expect("switch back");

    assert!(test.find_text("x").is_none());
    assert_eq!(test.labels_under(flexible), vec!["back"]);
}
