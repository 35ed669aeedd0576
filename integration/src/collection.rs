//! Fast collection aliases used across the engine for small, frequently
//! looked-up keys (position keys, trade ids, lot ids).

/// Fast `IndexMap` using the FNV hasher for better performance with small keys.
pub type FnvIndexMap<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

/// Fast `IndexSet` using the FNV hasher for better performance with small keys.
pub type FnvIndexSet<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;
