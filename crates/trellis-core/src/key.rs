//! Identity keys attached to configurations.
//!
//! A configuration without a key is matched by position only. Value and
//! object keys let a parent match children across reorders of its own child
//! list. Global keys are unique across the whole tree and let a subtree move
//! between parents without being torn down.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::collections::hash_one;

static NEXT_GLOBAL_KEY: AtomicU64 = AtomicU64::new(1);

trait KeyValue: Any + fmt::Debug {
    fn value_eq(&self, other: &dyn Any) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Eq + fmt::Debug + 'static> KeyValue for T {
    fn value_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Key compared by the value it wraps.
#[derive(Clone)]
pub struct ValueKey {
    type_id: TypeId,
    digest: u64,
    value: Rc<dyn KeyValue>,
}

impl ValueKey {
    pub fn new<T: Hash + Eq + fmt::Debug + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            digest: hash_one(&value),
            value: Rc::new(value),
        }
    }

    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.digest == other.digest
            && self.value.value_eq(other.value.as_any())
    }
}

impl Eq for ValueKey {}

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.digest.hash(state);
    }
}

impl fmt::Debug for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueKey({:?})", self.value)
    }
}

/// Key compared by the identity of the object it wraps.
#[derive(Clone)]
pub struct ObjectKey(Rc<dyn Any>);

impl ObjectKey {
    pub fn new(object: Rc<dyn Any>) -> Self {
        Self(object)
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for ObjectKey {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ObjectKey {}

impl Hash for ObjectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.address() as usize).hash(state);
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:p})", self.address())
    }
}

/// Key that is unique across an entire element tree.
///
/// Cloning a `GlobalKey` yields the same identity; [`GlobalKey::new`] always
/// yields a fresh one.
#[derive(Clone)]
pub struct GlobalKey {
    id: u64,
    label: Option<Rc<str>>,
}

impl GlobalKey {
    pub fn new() -> Self {
        Self {
            id: NEXT_GLOBAL_KEY.fetch_add(1, Ordering::Relaxed),
            label: None,
        }
    }

    pub fn labeled(label: impl Into<Rc<str>>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new()
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Default for GlobalKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for GlobalKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GlobalKey {}

impl Hash for GlobalKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "GlobalKey#{}({label})", self.id),
            None => write!(f, "GlobalKey#{}", self.id),
        }
    }
}

impl fmt::Display for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Value(ValueKey),
    Object(ObjectKey),
    Global(GlobalKey),
}

impl Key {
    pub fn value<T: Hash + Eq + fmt::Debug + 'static>(value: T) -> Self {
        Key::Value(ValueKey::new(value))
    }

    pub fn object(object: Rc<dyn Any>) -> Self {
        Key::Object(ObjectKey::new(object))
    }

    pub fn global() -> Self {
        Key::Global(GlobalKey::new())
    }

    pub fn as_global(&self) -> Option<&GlobalKey> {
        match self {
            Key::Global(key) => Some(key),
            _ => None,
        }
    }
}

impl From<GlobalKey> for Key {
    fn from(key: GlobalKey) -> Self {
        Key::Global(key)
    }
}

impl From<ValueKey> for Key {
    fn from(key: ValueKey) -> Self {
        Key::Value(key)
    }
}

impl From<ObjectKey> for Key {
    fn from(key: ObjectKey) -> Self {
        Key::Object(key)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Value(key) => fmt::Debug::fmt(key, f),
            Key::Object(key) => fmt::Debug::fmt(key, f),
            Key::Global(key) => fmt::Debug::fmt(key, f),
        }
    }
}

#[cfg(test)]
#[path = "tests/key_tests.rs"]
mod tests;
