//! Hash containers and hashing used across the element tree.
//!
//! The `std-hash` feature swaps `hashbrown`/`ahash` for the standard library
//! implementations, which is handy when comparing iteration order against a
//! reference run.

use std::hash::{Hash, Hasher};

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{hash_map::Entry, HashMap, HashSet};

    pub(crate) type KeyHasher = std::collections::hash_map::DefaultHasher;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{hash_map::Entry, HashMap, HashSet};

    pub(crate) type KeyHasher = ahash::AHasher;
}

/// Hashes a single value with the active key hasher.
///
/// Value keys store this digest so that equality checks can bail out early
/// without downcasting.
#[inline]
pub(crate) fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = map::KeyHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
