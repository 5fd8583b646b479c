use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::{GlobalKey, Lifecycle, TreeError, Widget};
use trellis_testing::{Boxed, Column, Counter, CounterState, EventLog, Mutation, TestTree, Text};

fn counter(key: &GlobalKey, events: &EventLog) -> Widget {
    Counter::new("c", events).with_key(key.clone()).widget()
}

fn creates_or_destroys(log: &[Mutation]) -> usize {
    log.iter()
        .filter(|mutation| matches!(mutation, Mutation::Create { .. } | Mutation::Destroy { .. }))
        .count()
}

#[test]
fn stateful_subtree_moves_between_parents() {
    let test = TestTree::new();
    let key = GlobalKey::labeled("counter");
    let events = EventLog::new();
    test.set_root(
        Column::new(
            "col",
            vec![
                Boxed::new("p1", Some(counter(&key, &events))).widget(),
                Boxed::new("p2", None).widget(),
            ],
        )
        .widget(),
    )
    .expect("initial build");

    let element = test.element_for(&key).expect("registered");
    element
        .state_handle::<CounterState>()
        .expect("counter state")
        .set_state(|state| state.count = 5)
        .expect("set state");
    test.pump().expect("pump");
    events.take();
    test.log().clear();

    test.set_root(
        Column::new(
            "col",
            vec![
                Boxed::new("p1", None).widget(),
                Boxed::new("p2", Some(counter(&key, &events))).widget(),
            ],
        )
        .widget(),
    )
    .expect("graft");

    let moved = test.element_for(&key).expect("still registered");
    assert!(moved.ptr_eq(&element));
    assert_eq!(moved.lifecycle(), Lifecycle::Active);
    assert_eq!(moved.with_state(|state: &CounterState| state.count), Some(5));
    assert_eq!(
        events.take(),
        vec!["deactivate c", "activate c", "update c", "build c"]
    );

    let mutations = test.log().take();
    assert_eq!(creates_or_destroys(&mutations), 0);
    assert_eq!(mutations.len(), 2, "{mutations:?}");
    assert!(matches!(mutations[0], Mutation::Remove { .. }));
    assert!(matches!(mutations[1], Mutation::Insert { after: None, .. }));

    let boxes = test.child().expect("column").children();
    let p1 = boxes[0].primitive().expect("p1");
    let p2 = boxes[1].primitive().expect("p2");
    assert!(test.labels_under(p1).is_empty());
    assert_eq!(test.labels_under(p2), vec!["c:5"]);
    assert_eq!(events.count("init c"), 0);
    assert_eq!(events.count("dispose c"), 0);
}

#[test]
fn subtree_moves_from_single_slot_into_list() {
    let test = TestTree::new();
    let key = GlobalKey::new();
    let events = EventLog::new();
    test.set_root(
        Column::new(
            "col",
            vec![Boxed::new("p", Some(counter(&key, &events))).widget()],
        )
        .widget(),
    )
    .expect("initial build");
    let element = test.element_for(&key).expect("registered");
    events.take();
    test.log().clear();

    test.set_root(
        Column::new(
            "col",
            vec![counter(&key, &events), Boxed::new("p", None).widget()],
        )
        .widget(),
    )
    .expect("graft");

    assert!(test.element_for(&key).is_some_and(|found| found.ptr_eq(&element)));
    assert_eq!(
        test.take_described(),
        vec!["remove c:0", "insert c:0 first"]
    );
    let column = test.child().expect("column");
    assert_eq!(
        test.labels_under(column.primitive().expect("column primitive")),
        vec!["c:0", "p"]
    );
    let boxed = &column.children()[1];
    assert!(boxed.children().is_empty());
    assert_eq!(events.count("deactivate c"), 1);
    assert_eq!(events.count("activate c"), 1);
    assert_eq!(events.count("dispose c"), 0);
}

#[test]
fn removed_key_gets_a_fresh_element_when_readded() {
    let test = TestTree::new();
    let key = GlobalKey::new();
    let events = EventLog::new();
    test.set_root(Column::new("col", vec![counter(&key, &events)]).widget())
        .expect("initial build");
    let element = test.element_for(&key).expect("registered");

    test.set_root(Column::new("col", Vec::new()).widget())
        .expect("remove");
    assert_eq!(element.lifecycle(), Lifecycle::Defunct);
    assert!(test.element_for(&key).is_none());

    test.set_root(Column::new("col", vec![counter(&key, &events)]).widget())
        .expect("re-add");
    let fresh = test.element_for(&key).expect("registered again");
    assert!(!fresh.ptr_eq(&element));
    assert_eq!(events.count("init c"), 2);
    assert_eq!(events.count("dispose c"), 1);
}

#[test]
fn duplicate_keys_of_different_types_are_reported() {
    let test = TestTree::new();
    let key = GlobalKey::labeled("dup");
    let result = test.set_root(
        Column::new(
            "col",
            vec![
                Text::keyed("t", key.clone()).widget(),
                Boxed::new("b", None).with_key(key.clone()).widget(),
            ],
        )
        .widget(),
    );

    match result {
        Err(TreeError::DuplicateGlobalKeys { keys }) => {
            assert_eq!(keys.len(), 1);
            assert!(keys[0].contains("dup"), "{keys:?}");
        }
        other => panic!("expected duplicate keys, got {other:?}"),
    }
    let holder = test.element_for(&key).expect("registered");
    assert!(holder.widget().downcast_ref::<Boxed>().is_some());
}

#[test]
fn duplicate_keys_among_siblings_are_reported() {
    let test = TestTree::new();
    let key = GlobalKey::new();
    let result = test.set_root(
        Column::new(
            "col",
            vec![
                Text::keyed("a", key.clone()).widget(),
                Text::keyed("b", key.clone()).widget(),
            ],
        )
        .widget(),
    );

    assert!(matches!(result, Err(TreeError::DuplicateGlobalKeys { .. })));
    assert_eq!(test.root_labels(), vec!["col"]);
    let column = test.child().expect("column");
    assert_eq!(column.children().len(), 2);
}

fn nested(key: &GlobalKey, innermost: Option<Widget>) -> Widget {
    Boxed::new(
        "outer",
        Some(Boxed::new("inner", innermost).widget()),
    )
    .with_key(key.clone())
    .widget()
}

#[test]
#[should_panic(expected = "cannot be grafted into its own subtree")]
fn grafting_into_own_subtree_panics_when_strict() {
    let test = TestTree::new();
    let key = GlobalKey::new();
    test.set_root(nested(&key, None)).expect("initial build");

    let looped = Boxed::new("again", None).with_key(key.clone()).widget();
    let _ = test.set_root(nested(&key, Some(looped)));
}

#[test]
fn grafting_into_own_subtree_is_refused_when_lenient() {
    let test = TestTree::lenient();
    let key = GlobalKey::new();
    test.set_root(nested(&key, None)).expect("initial build");
    let outer = test.element_for(&key).expect("registered");

    let looped = Boxed::new("again", None).with_key(key.clone()).widget();
    let result = test.set_root(nested(&key, Some(looped)));

    assert!(matches!(result, Err(TreeError::DuplicateGlobalKeys { .. })));
    assert_eq!(outer.lifecycle(), Lifecycle::Active);
    assert!(test.child().is_some_and(|child| child.ptr_eq(&outer)));
}

#[test]
fn removal_listeners_run_when_tasks_drain() {
    let test = TestTree::new();
    let key = GlobalKey::labeled("gone");
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = removed.clone();
    let listener = test
        .owner()
        .add_global_key_removed_listener(move |key| sink.borrow_mut().push(key.clone()));

    test.set_root(Column::new("col", vec![Text::keyed("a", key.clone()).widget()]).widget())
        .expect("initial build");
    test.set_root(Column::new("col", Vec::new()).widget())
        .expect("remove");

    assert!(removed.borrow().is_empty());
    assert_eq!(test.owner().pending_tasks(), 1);
    assert_eq!(test.drain_tasks(), 1);
    assert_eq!(*removed.borrow(), vec![key.clone()]);

    assert!(test.owner().remove_global_key_removed_listener(listener));
    assert!(!test.owner().remove_global_key_removed_listener(listener));
}

#[test]
fn moving_a_key_within_the_pass_is_not_a_removal() {
    let test = TestTree::new();
    let key = GlobalKey::new();
    let events = EventLog::new();
    let calls = Rc::new(RefCell::new(0));
    let sink = calls.clone();
    test.owner()
        .add_global_key_removed_listener(move |_| *sink.borrow_mut() += 1);

    test.set_root(
        Column::new(
            "col",
            vec![
                Boxed::new("p1", Some(counter(&key, &events))).widget(),
                Boxed::new("p2", None).widget(),
            ],
        )
        .widget(),
    )
    .expect("initial build");
    test.set_root(
        Column::new(
            "col",
            vec![
                Boxed::new("p1", None).widget(),
                Boxed::new("p2", Some(counter(&key, &events))).widget(),
            ],
        )
        .widget(),
    )
    .expect("graft");

    test.drain_tasks();
    assert_eq!(*calls.borrow(), 0);
    assert_eq!(test.owner().global_key_count(), 1);
}
