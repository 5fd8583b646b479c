use super::*;
use crate::collections::map::HashSet;

#[test]
fn value_keys_compare_by_type_and_value() {
    assert_eq!(Key::value(1u32), Key::value(1u32));
    assert_ne!(Key::value(1u32), Key::value(2u32));
    // Same bits, different type.
    assert_ne!(Key::value(1u32), Key::value(1u64));
    assert_eq!(Key::value("row"), Key::value("row"));
}

#[test]
fn value_key_exposes_wrapped_value() {
    let key = ValueKey::new(String::from("item-7"));
    assert_eq!(key.value::<String>().map(String::as_str), Some("item-7"));
    assert!(key.value::<u32>().is_none());
}

#[test]
fn object_keys_compare_by_identity() {
    let shared: Rc<dyn Any> = Rc::new(5u8);
    let a = Key::object(shared.clone());
    let b = Key::object(shared);
    let c = Key::object(Rc::new(5u8));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn global_keys_are_unique_until_cloned() {
    let first = GlobalKey::new();
    let second = GlobalKey::new();
    assert_ne!(first, second);
    assert_eq!(first, first.clone());
    assert_ne!(Key::from(first.clone()), Key::from(second));
    assert_eq!(Key::from(first.clone()).as_global(), Some(&first));
}

#[test]
fn keys_of_different_kinds_never_match() {
    let global = GlobalKey::new();
    let value = Key::value(global.id());
    assert_ne!(value, Key::Global(global));
    assert!(value.as_global().is_none());
}

#[test]
fn keys_hash_consistently_with_equality() {
    let mut set = HashSet::new();
    set.insert(Key::value(3i32));
    set.insert(Key::value(3i32));
    set.insert(Key::value(4i32));
    let global = GlobalKey::labeled("header");
    set.insert(Key::Global(global.clone()));
    set.insert(Key::Global(global));
    assert_eq!(set.len(), 3);
}

#[test]
fn labeled_global_key_debug_output() {
    let key = GlobalKey::labeled("sidebar");
    assert_eq!(key.label(), Some("sidebar"));
    assert_eq!(format!("{key:?}"), format!("GlobalKey#{}(sidebar)", key.id()));
    assert_eq!(format!("{key}"), format!("{key:?}"));
}
