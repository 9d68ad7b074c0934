#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bucket_table;

/// Errors reported by the map.
pub mod error;

/// Hash mixing primitives and the default hasher.
///
/// This module provides the 128-bit multiply-and-fold mixer the map applies
/// to every key hash, a byte hasher for string and slice keys, and
/// [`MixState`], the default [`BuildHasher`](core::hash::BuildHasher) of
/// [`HashMap`].
pub mod hash;

/// An insertion-ordered hash map using Robin Hood open addressing.
///
/// This module provides a `HashMap` that stores entries densely in insertion
/// order and indexes them through a bucket table of packed fingerprints and
/// probe distances.
pub mod hash_map;

#[cfg(feature = "serde")]
mod serde;

#[cfg(feature = "stats")]
pub use bucket_table::DebugStats;
pub use bucket_table::MAX_LOAD_FACTOR;
#[cfg(feature = "stats")]
pub use bucket_table::ProbeHistogram;
pub use error::Error;
pub use hash::MixState;
pub use hash_map::Entry;
pub use hash_map::HashMap;

/// A [`HashMap`] hashing keys with [`foldhash`]'s fast, randomly seeded
/// hasher.
#[cfg(feature = "foldhash")]
pub type FoldHashMap<K, V> = HashMap<K, V, foldhash::fast::RandomState>;
