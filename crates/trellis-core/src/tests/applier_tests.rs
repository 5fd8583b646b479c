use super::*;

#[derive(Default)]
struct Label {
    text: String,
    mounted: bool,
}

impl Primitive for Label {
    fn mount(&mut self) {
        self.mounted = true;
    }
}

#[test]
fn place_child_orders_after_predecessor() {
    let mut children = vec![1, 2, 3];
    place_child(&mut children, 4, Some(1));
    assert_eq!(children, vec![1, 4, 2, 3]);

    place_child(&mut children, 3, None);
    assert_eq!(children, vec![3, 1, 4, 2]);

    place_child(&mut children, 2, Some(3));
    assert_eq!(children, vec![3, 2, 1, 4]);
}

#[test]
fn place_child_appends_after_unknown_predecessor() {
    let mut children = vec![1, 2];
    place_child(&mut children, 9, Some(42));
    assert_eq!(children, vec![1, 2, 9]);
}

#[test]
fn memory_applier_creates_and_removes() {
    let mut applier = MemoryApplier::new();
    let id = applier.create(Box::new(Label::default()));
    assert!(applier.contains(id));
    assert_eq!(applier.len(), 1);

    applier
        .with_primitive(id, |label: &mut Label| label.text.push_str("hello"))
        .expect("label exists");
    let text = applier
        .with_primitive(id, |label: &mut Label| label.text.clone())
        .expect("label exists");
    assert_eq!(text, "hello");

    applier.remove(id).expect("remove label");
    assert!(applier.is_empty());
    assert_eq!(applier.remove(id), Err(NodeError::Missing { id }));
    assert!(applier.get_mut(id).is_err());
}

#[test]
fn with_primitive_reports_type_mismatch() {
    let mut applier = MemoryApplier::new();
    let id = applier.create(Box::new(RootPrimitive::default()));
    let result = applier.with_primitive(id, |_: &mut Label| ());
    assert!(matches!(result, Err(NodeError::TypeMismatch { id: found, .. }) if found == id));
}

#[test]
fn structural_calls_reach_parent_primitive() {
    let mut applier = MemoryApplier::new();
    let root = applier.create(Box::new(RootPrimitive::default()));
    let a = applier.create(Box::new(Label::default()));
    let b = applier.create(Box::new(Label::default()));

    applier.insert_child(root, a, None).expect("insert a");
    applier.insert_child(root, b, Some(a)).expect("insert b");
    assert_eq!(applier.get_mut(root).expect("root").children(), vec![a, b]);

    applier.move_child(root, b, None).expect("move b");
    assert_eq!(applier.get_mut(root).expect("root").children(), vec![b, a]);

    applier.remove_child(root, b).expect("remove b");
    assert_eq!(applier.get_mut(root).expect("root").children(), vec![a]);

    assert_eq!(
        applier.insert_child(99, a, None),
        Err(NodeError::Missing { id: 99 })
    );
}

#[test]
fn dump_tree_walks_children() {
    let mut applier = MemoryApplier::new();
    let root = applier.create(Box::new(RootPrimitive::default()));
    let label = applier.create(Box::new(Label::default()));
    applier.insert_child(root, label, None).expect("insert");
    applier.insert_child(root, 7, Some(label)).expect("insert dangling");

    let dump = applier.dump_tree(Some(root));
    assert!(dump.starts_with(&format!("[{root}] ")));
    assert!(dump.contains("RootPrimitive"));
    assert!(dump.contains(&format!("  [{label}] ")));
    assert!(dump.contains("Label"));
    assert!(dump.contains("  [7] (missing)"));
    assert_eq!(applier.dump_tree(None), "(no root)\n");
}

#[test]
fn mount_hook_is_left_to_the_caller() {
    let mut applier = MemoryApplier::new();
    let id = applier.create(Box::new(Label::default()));
    assert!(!applier.with_primitive(id, |label: &mut Label| label.mounted).expect("label"));
    applier.get_mut(id).expect("label").mount();
    assert!(applier.with_primitive(id, |label: &mut Label| label.mounted).expect("label"));
}
