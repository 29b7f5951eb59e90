//! Append-only response cache keyed by the full set of call arguments.

mod key;
mod store;

pub use key::{CacheKey, KeyMaterial};
pub use store::{CacheEntry, CacheStore, DiskCache, MemoryCache};
