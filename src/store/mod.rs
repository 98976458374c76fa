//! Typed in-memory storage
//!
//! Exclusive owner of every key entry and every fetch-cache entry. Expired
//! entries are removed lazily by every accessor, so they are never observable
//! by a read; the periodic sweep (driven by the server) handles the rest.

mod entry;
mod memory;
mod value;

pub use entry::Entry;
pub use memory::{CacheEntry, MemoryStore};
pub use value::Value;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
